use strato_proto::prelude::ProtoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("HTTP error: {status}: {body}")]
    Status { status: u16, body: String },

    #[error(
        "Query has timed out. The most likely cause is a query calling for too much data at \
         once. Please check the filters and avoid calling for unnecessary data."
    )]
    ServerTimeout,

    #[error("Failed to serialize request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Bad Response: success reported without data")]
    MissingData,

    #[error("Bad Response: {0}")]
    Shape(#[from] ProtoError),

    /// Rejected by the API; displays the server message verbatim.
    #[error("{0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[source] ProtoError),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job never completed successfully after {polls} status checks")]
    JobIncomplete { polls: u32 },
}

impl QueryError {
    /// Message reported by the API for a rejected query.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            QueryError::Api(message) => Some(message),
            _ => None,
        }
    }

    /// Failures where sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Transport(_) | QueryError::ServerTimeout)
    }

    /// The response arrived but could not be read as an envelope or table.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            QueryError::Decode(_) | QueryError::MissingData | QueryError::Shape(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
