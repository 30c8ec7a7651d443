// Query submission tests against a mock API server.
// The mock checks the exact request envelope, so token shape and headers are verified too.

use std::collections::BTreeMap;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use strato_client::{Client, ClientConfig, QueryError};
use strato_proto::prelude::*;

fn client_for(server: &MockServer) -> Client {
    Client::new(ClientConfig::default().with_endpoint(server.url("/api"))).unwrap()
}

fn year_query() -> Query {
    QueryBuilder::new()
        .field("table", "populationforecast")
        .filter(lt_filter("year", 2018))
        .filter(nin_filter("geoid2", [36, 34]))
        .build()
}

// ========== Single query ==========

#[test]
fn test_submit_success_returns_table() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api")
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json_body(json!({
                "token": "my-token",
                "query": {
                    "table": "populationforecast",
                    "filters": [
                        {"operator": "lt", "variable": "year", "value": 2018},
                        {"operator": "nin", "variable": "geoid2", "value": [36, 34]},
                    ],
                },
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"success": true, "data": [{"year": 2018, "value": 1}]}));
    });

    let table = client_for(&server)
        .submit(&year_query(), "my-token")
        .unwrap();

    mock.assert();
    assert_eq!(table.len(), 1);
    assert_eq!(table.names(), ["year", "value"]);
    assert_eq!(table.get(0, "year"), Some(&Scalar::Int(2018)));
    assert_eq!(table.get(0, "value"), Some(&Scalar::Int(1)));
}

#[test]
fn test_submit_api_error_carries_message() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200)
            .json_body(json!({"success": false, "message": "invalid token"}));
    });

    let err = client_for(&server)
        .submit(&year_query(), "bad-token")
        .unwrap_err();

    mock.assert();
    assert!(matches!(err, QueryError::Api(_)));
    assert_eq!(err.to_string(), "invalid token");
    assert_eq!(err.api_message(), Some("invalid token"));
    assert!(!err.is_retryable());
}

#[test]
fn test_token_from_sequence_is_sent_as_string() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api")
            .json_body(json!({"token": "boxed", "query": {"table": "t"}}));
        then.status(200).json_body(json!({"success": true, "data": []}));
    });

    let token = ApiToken::try_from(vec!["boxed".to_string()]).unwrap();
    let table = client_for(&server)
        .submit(&json!({"table": "t"}), token)
        .unwrap();

    mock.assert();
    assert!(table.is_empty());
}

#[test]
fn test_submit_raw_returns_data_untouched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200)
            .json_body(json!({"success": true, "data": [{"nested": {"a": 1}}]}));
    });

    let client = client_for(&server);
    let data = client.submit_raw(&year_query(), "t").unwrap();
    assert_eq!(data, json!([{"nested": {"a": 1}}]));

    // the same payload is not table-shaped
    let err = client.submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::Shape(ProtoError::NestedCell { .. })));
    assert!(err.is_decode());
}

#[test]
fn test_extra_headers_are_sent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api").header("x-client", "strato-tests");
        then.status(200).json_body(json!({"success": true, "data": []}));
    });

    let config = ClientConfig::default()
        .with_endpoint(server.url("/api"))
        .with_header("X-Client", "strato-tests");
    Client::new(config)
        .unwrap()
        .submit(&year_query(), "t")
        .unwrap();

    mock.assert();
}

#[test]
fn test_uppercase_columns() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200)
            .json_body(json!({"success": true, "data": {"year": [2018, 2019]}}));
    });

    let config = ClientConfig::default()
        .with_endpoint(server.url("/api"))
        .with_uppercase_columns(true);
    let table = Client::new(config)
        .unwrap()
        .submit(&year_query(), "t")
        .unwrap();

    assert_eq!(table.names(), ["YEAR"]);
    assert_eq!(table.len(), 2);
}

// ========== Failure modes ==========

#[test]
fn test_malformed_json_is_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200).body("<html>not json</html>");
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::Decode(_)));
    assert!(err.is_decode());
}

#[test]
fn test_success_without_data_is_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200).json_body(json!({"success": true}));
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::MissingData));
}

#[test]
fn test_http_status_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(500).body("internal failure");
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    match err {
        QueryError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal failure");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_http_520_is_server_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(520);
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::ServerTimeout));
    assert!(err.is_retryable());
}

#[test]
fn test_non_utf8_body_is_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200).body(vec![0xff, 0xfe, 0x7b]);
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::Decode(_)));
    assert!(err.is_decode());
    assert!(!err.is_retryable());
}

#[test]
fn test_http_520_with_non_utf8_body_is_server_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(520).body(vec![0xff, 0xfe]);
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::ServerTimeout));
}

#[test]
fn test_http_status_keeps_non_utf8_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(502).body(vec![b'b', b'a', b'd', 0xff]);
    });

    match client_for(&server).submit(&year_query(), "t").unwrap_err() {
        QueryError::Status { status, body } => {
            assert_eq!(status, 502);
            assert!(body.starts_with("bad"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_rejection_without_message_is_empty_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200).json_body(json!({"success": false}));
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert_eq!(err.api_message(), Some(""));
}

#[test]
fn test_null_data_is_missing_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200).json_body(json!({"success": true, "data": null}));
    });

    let err = client_for(&server).submit(&year_query(), "t").unwrap_err();
    assert!(matches!(err, QueryError::MissingData));
    assert!(err.is_decode());
}

#[test]
fn test_uppercase_collision_is_shape_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200)
            .json_body(json!({"success": true, "data": [{"year": 2018, "YEAR": 2019}]}));
    });

    let config = ClientConfig::default()
        .with_endpoint(server.url("/api"))
        .with_uppercase_columns(true);
    let err = Client::new(config)
        .unwrap()
        .submit(&year_query(), "t")
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Shape(ProtoError::DuplicateColumn(_))
    ));
}

#[test]
fn test_connection_refused_is_transport_error() {
    let config = ClientConfig::default()
        .with_endpoint("http://127.0.0.1:1/api")
        .with_timeout(Duration::from_secs(5));
    let err = Client::new(config)
        .unwrap()
        .submit(&year_query(), "t")
        .unwrap_err();

    assert!(matches!(err, QueryError::Transport(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = Client::new(ClientConfig::default().with_endpoint("not a url")).unwrap_err();
    assert!(matches!(err, QueryError::InvalidConfig(_)));

    let duplicate = ClientConfig::default()
        .with_endpoint("http://localhost/api")
        .with_header("Content-Type", "text/plain");
    assert!(matches!(
        Client::new(duplicate),
        Err(QueryError::InvalidConfig(_))
    ));
}

// ========== Batches ==========

#[test]
fn test_submit_many_in_chunks() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST).path("/api").json_body(json!({
            "token": "t",
            "queries": {"a": {"table": "a"}, "b": {"table": "b"}},
        }));
        then.status(200).json_body(json!({
            "success": true,
            "data": {"a": [{"year": 2018}], "b": [{"year": 2019}]},
        }));
    });
    let second = server.mock(|when, then| {
        when.method(POST).path("/api").json_body(json!({
            "token": "t",
            "queries": {"c": {"table": "c"}},
        }));
        then.status(200).json_body(json!({
            "success": true,
            "data": {"c": {"year": [2020, 2021]}},
        }));
    });

    let queries = ["a", "b", "c"]
        .into_iter()
        .map(|name| (name.to_string(), json!({"table": name})))
        .collect::<BTreeMap<_, _>>();
    let config = ClientConfig::default()
        .with_endpoint(server.url("/api"))
        .with_chunk_size(2)
        .with_chunk_pause(Duration::from_millis(1));
    let tables = Client::new(config)
        .unwrap()
        .submit_many(&queries, "t")
        .unwrap();

    first.assert();
    second.assert();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables["a"].get(0, "year"), Some(&Scalar::Int(2018)));
    assert_eq!(tables["b"].get(0, "year"), Some(&Scalar::Int(2019)));
    assert_eq!(tables["c"].len(), 2);
}

#[test]
fn test_submit_many_rejects_non_object_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200)
            .json_body(json!({"success": true, "data": [{"year": 2018}]}));
    });

    let mut queries = BTreeMap::new();
    queries.insert("a".to_string(), year_query());
    let err = client_for(&server).submit_many(&queries, "t").unwrap_err();
    assert!(matches!(err, QueryError::Shape(ProtoError::NotTabular(_))));
}

#[test]
fn test_submit_many_stops_at_rejected_chunk() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST).path("/api").json_body(json!({
            "token": "t",
            "queries": {"a": {"table": "a"}},
        }));
        then.status(200)
            .json_body(json!({"success": true, "data": {"a": [{"year": 2018}]}}));
    });
    let second = server.mock(|when, then| {
        when.method(POST).path("/api").json_body(json!({
            "token": "t",
            "queries": {"b": {"table": "b"}},
        }));
        then.status(200)
            .json_body(json!({"success": false, "message": "quota exceeded"}));
    });
    let third = server.mock(|when, then| {
        when.method(POST).path("/api").json_body(json!({
            "token": "t",
            "queries": {"c": {"table": "c"}},
        }));
        then.status(200)
            .json_body(json!({"success": true, "data": {"c": []}}));
    });

    let queries = ["a", "b", "c"]
        .into_iter()
        .map(|name| (name.to_string(), json!({"table": name})))
        .collect::<BTreeMap<_, _>>();
    let config = ClientConfig::default()
        .with_endpoint(server.url("/api"))
        .with_chunk_size(1);
    let err = Client::new(config)
        .unwrap()
        .submit_many(&queries, "t")
        .unwrap_err();

    first.assert();
    second.assert();
    third.assert_calls(0);
    assert_eq!(err.api_message(), Some("quota exceeded"));
}

// ========== Concurrency ==========

#[test]
fn test_concurrent_submissions_do_not_interfere() {
    let server = MockServer::start();
    let mocks = ["alpha", "beta"].map(|token| {
        server.mock(move |when, then| {
            when.method(POST)
                .path("/api")
                .json_body(json!({"token": token, "query": {"table": token}}));
            then.status(200)
                .json_body(json!({"success": true, "data": [{"owner": token}]}));
        })
    });

    let client = client_for(&server);
    std::thread::scope(|s| {
        let handles = ["alpha", "beta"].map(|token| {
            let client = &client;
            s.spawn(move || client.submit(&json!({"table": token}), token).unwrap())
        });
        for (handle, token) in handles.into_iter().zip(["alpha", "beta"]) {
            let table = handle.join().unwrap();
            assert_eq!(table.get(0, "owner"), Some(&Scalar::from(token)));
        }
    });

    for mock in &mocks {
        mock.assert();
    }
}
