//! Query submission over HTTP.
//!
//! Every call builds a fresh envelope, performs exactly one blocking POST per
//! request (one per chunk for batches) and unwraps the `success`/`message`/
//! `data` response envelope. Nothing is retried or cached.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use strato_proto::prelude::*;
use ureq::Agent;

use crate::config::ClientConfig;
use crate::error::{QueryError, Result};

const MAX_RESPONSE_BYTES: u64 = 1 << 30;
const HTTP_SERVER_TIMEOUT: u16 = 520;

/// Blocking client for the analytics API.
///
/// Holds only immutable settings and the HTTP agent, so one client can be
/// shared between threads.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    agent: Agent,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let agent_config = Agent::config_builder()
            .timeout_global(config.timeout)
            .http_status_as_error(false)
            .build();
        Ok(Self {
            config,
            agent: Agent::new_with_config(agent_config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit one query and return its result as a table.
    pub fn submit<Q: Serialize>(&self, query: &Q, token: impl Into<ApiToken>) -> Result<Table> {
        let data = self.submit_raw(query, token)?;
        self.to_table(&data)
    }

    /// Submit one query and return the `data` field untouched.
    pub fn submit_raw<Q: Serialize>(&self, query: &Q, token: impl Into<ApiToken>) -> Result<Value> {
        let token = token.into();
        self.post(&RequestEnvelope::new(&token, query))
    }

    /// Submit named queries in chunks of `chunk_size`, one request per chunk.
    ///
    /// Fails on the first rejected chunk; results of earlier chunks are
    /// dropped.
    pub fn submit_many<Q: Serialize>(
        &self,
        queries: &BTreeMap<String, Q>,
        token: impl Into<ApiToken>,
    ) -> Result<BTreeMap<String, Table>> {
        let token = token.into();
        let entries = queries.iter().collect::<Vec<_>>();
        let chunks = entries.chunks(self.config.chunk_size).collect::<Vec<_>>();
        let mut tables = BTreeMap::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            log::debug!(
                "Submitting chunk {}/{} with {} queries",
                idx + 1,
                chunks.len(),
                chunk.len()
            );
            let envelope = BatchRequestEnvelope::new(
                &token,
                chunk.iter().map(|(name, query)| (name.as_str(), *query)),
            );
            let data = match self.post(&envelope)? {
                Value::Object(map) => map,
                other => {
                    return Err(ProtoError::NotTabular(format!(
                        "batch data must be an object keyed by query name, got {other}"
                    ))
                    .into())
                }
            };
            for (name, value) in data {
                let table = self.to_table(&value)?;
                tables.insert(name, table);
            }

            if let Some(pause) = self.config.chunk_pause {
                if idx + 1 < chunks.len() {
                    std::thread::sleep(pause);
                }
            }
        }

        Ok(tables)
    }

    fn to_table(&self, data: &Value) -> Result<Table> {
        let table = Table::from_json(data)?;
        if self.config.uppercase_columns {
            Ok(table.with_uppercase_names()?)
        } else {
            Ok(table)
        }
    }

    /// Post an envelope and return the `data` of a successful response.
    fn post<B: Serialize>(&self, envelope: &B) -> Result<Value> {
        let bytes = self.send_json(&self.config.endpoint, envelope, None)?;
        let envelope: ResponseEnvelope = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            let message = envelope.message.unwrap_or_default();
            log::warn!("Query rejected by API: {message}");
            return Err(QueryError::Api(message));
        }
        envelope.data.ok_or(QueryError::MissingData)
    }

    /// POST `body` as JSON to `url` and return the raw body of a 2xx response.
    ///
    /// The status is checked before the body is decoded: 520 is a server-side
    /// timeout and any other non-2xx status is returned with its body.
    pub(crate) fn send_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        bearer: Option<&ApiToken>,
    ) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(body).map_err(QueryError::Encode)?;
        log::debug!("Posting {} bytes to {url}", body.len());

        let mut request = self
            .agent
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token.expose()));
        }
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = request.send(&body[..])?;
        let status = response.status().as_u16();
        if status == HTTP_SERVER_TIMEOUT {
            log::warn!("Server timed out answering {url}");
            return Err(QueryError::ServerTimeout);
        }

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_vec()?;
        log::debug!("Received HTTP {status} with {} bytes", bytes.len());

        if !(200..300).contains(&status) {
            return Err(QueryError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }
}
