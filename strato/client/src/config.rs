use std::time::Duration;

use crate::error::{QueryError, Result};

/// Endpoint queries are posted to unless configured otherwise.
pub const DEFAULT_API_URL: &str = "https://api.example.com/api";

/// Base URL of the job pipeline; `create`, `status` and `download` are
/// appended to it.
pub const DEFAULT_JOBS_URL: &str = "https://api.example.com/jobs";

/// Maximum number of named queries sent in one batch request.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

const RESERVED_HEADERS: [&str; 3] = ["Content-Type", "Accept", "Authorization"];

pub const ENV_STRATO_API_URL: &str = "STRATO_API_URL";
pub const ENV_STRATO_JOBS_URL: &str = "STRATO_JOBS_URL";
pub const ENV_STRATO_TIMEOUT_SECS: &str = "STRATO_TIMEOUT_SECS";

/// Settings of a [`crate::Client`].
///
/// The default points at [`DEFAULT_API_URL`] with no timeout, so the call
/// blocks for as long as the transport allows.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub jobs_endpoint: String,
    pub timeout: Option<Duration>,
    /// Extra request headers. `Content-Type`, `Accept` and `Authorization` are
    /// set by the client and rejected here.
    pub headers: Vec<(String, String)>,
    pub chunk_size: usize,
    /// Pause between batch chunks.
    pub chunk_pause: Option<Duration>,
    pub uppercase_columns: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_URL.to_string(),
            jobs_endpoint: DEFAULT_JOBS_URL.to_string(),
            timeout: None,
            headers: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_pause: None,
            uppercase_columns: false,
        }
    }
}

impl ClientConfig {
    /// Default settings overridden by `STRATO_API_URL`, `STRATO_JOBS_URL`
    /// and `STRATO_TIMEOUT_SECS` when they are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_STRATO_API_URL) {
            if !url.is_empty() {
                log::debug!("Using API endpoint from {ENV_STRATO_API_URL}: {url}");
                config.endpoint = url;
            }
        }

        if let Ok(url) = std::env::var(ENV_STRATO_JOBS_URL) {
            if !url.is_empty() {
                log::debug!("Using jobs endpoint from {ENV_STRATO_JOBS_URL}: {url}");
                config.jobs_endpoint = url;
            }
        }

        if let Ok(secs) = std::env::var(ENV_STRATO_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<f64>().map_err(|e| {
                QueryError::InvalidConfig(format!("{ENV_STRATO_TIMEOUT_SECS}={secs}: {e}"))
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(QueryError::InvalidConfig(format!(
                    "{ENV_STRATO_TIMEOUT_SECS} must be a positive number of seconds"
                )));
            }
            log::debug!("Using request timeout from {ENV_STRATO_TIMEOUT_SECS}: {secs}s");
            config.timeout = Some(Duration::from_secs_f64(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_jobs_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.jobs_endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause = Some(pause);
        self
    }

    pub fn with_uppercase_columns(mut self, uppercase: bool) -> Self {
        self.uppercase_columns = uppercase;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for url in [&self.endpoint, &self.jobs_endpoint] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(QueryError::InvalidConfig(format!(
                    "endpoint must be an http(s) URL, got `{url}`"
                )));
            }
        }
        if self.chunk_size == 0 {
            return Err(QueryError::InvalidConfig(
                "chunk size must be a positive integer".to_string(),
            ));
        }
        if let Some((name, _)) = self
            .headers
            .iter()
            .find(|(name, _)| RESERVED_HEADERS.iter().any(|r| r.eq_ignore_ascii_case(name)))
        {
            return Err(QueryError::InvalidConfig(format!(
                "header `{name}` is set by the client and cannot be overridden"
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(QueryError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
