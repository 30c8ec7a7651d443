//! Client library for the StratoDem analytics API.
//!
//! Queries are assembled from filter descriptors, posted as a
//! `{"token": ..., "query": ...}` envelope and answered with a table.
//!
//! ```no_run
//! use strato_query::prelude::*;
//!
//! let query = QueryBuilder::new()
//!     .field("table", "populationforecast")
//!     .filter(lt_filter("year", 2018))
//!     .filter(nin_filter("geoid2", [36, 34]))
//!     .build();
//!
//! let table = submit_api_query(&query, "my-api-token")?;
//! for row in table.iter() {
//!     println!("{:?}", row.get("year"));
//! }
//! # Ok::<(), strato_query::QueryError>(())
//! ```

use env_logger::Env;

pub use strato_client::{
    submit_api_query, Client, ClientConfig, JobRunner, QueryError, DEFAULT_API_URL,
    DEFAULT_JOBS_URL,
};
pub use strato_proto as proto;

pub const ENV_STRATO_LOGLEVEL: &str = "STRATO_LOGLEVEL";

pub mod prelude {
    pub use strato_client::{submit_api_query, Client, ClientConfig, JobRunner, QueryError};
    pub use strato_proto::prelude::*;
}

/// Install an `env_logger` filtered by `STRATO_LOGLEVEL`.
///
/// Safe to call more than once; the first logger installed in the process is
/// kept.
pub fn init_logging() {
    if env_logger::try_init_from_env(Env::new().filter(ENV_STRATO_LOGLEVEL)).is_ok() {
        log::debug!("Logging initialized from {ENV_STRATO_LOGLEVEL}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
