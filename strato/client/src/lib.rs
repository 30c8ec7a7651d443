pub mod client;
pub mod config;
pub mod error;
pub mod jobs;

use serde::Serialize;
use strato_proto::prelude::{ApiToken, Table};

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_CHUNK_SIZE, DEFAULT_JOBS_URL};
pub use error::{QueryError, Result};
pub use jobs::JobRunner;

/// Submit `query` to the default endpoint and return the result table.
///
/// Performs one blocking POST of `{"token": ..., "query": ...}`. Transport
/// failures, undecodable responses and API rejections come back as distinct
/// [`QueryError`] variants.
pub fn submit_api_query<Q: Serialize>(query: &Q, token: impl Into<ApiToken>) -> Result<Table> {
    Client::new(ClientConfig::default())?.submit(query, token)
}
