//! Request and response types for the asynchronous job pipeline
//! (`jobs/create`, `jobs/status`, `jobs/download`).

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::error::json_kind;
use crate::types::ProtoError;

/// Geographic level a job is computed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Geolevel {
    Us,
    Metro,
    Geoid2,
    Geoid5,
    Zip,
    Geoid11,
}

impl Geolevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Geolevel::Us => "US",
            Geolevel::Metro => "METRO",
            Geolevel::Geoid2 => "GEOID2",
            Geolevel::Geoid5 => "GEOID5",
            Geolevel::Zip => "ZIP",
            Geolevel::Geoid11 => "GEOID11",
        }
    }
}

impl Display for Geolevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Geolevel {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "US" => Ok(Geolevel::Us),
            "METRO" => Ok(Geolevel::Metro),
            "GEOID2" => Ok(Geolevel::Geoid2),
            "GEOID5" => Ok(Geolevel::Geoid5),
            "ZIP" => Ok(Geolevel::Zip),
            "GEOID11" => Ok(Geolevel::Geoid11),
            other => Err(ProtoError::InvalidJob(format!(
                "geolevel must be one of US, METRO, GEOID2, GEOID5, ZIP, GEOID11 (was `{other}`)"
            ))),
        }
    }
}

/// Format of the file a finished job is downloaded as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ResponseFormat {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ResponseFormat::Csv),
            "json" => Ok(ResponseFormat::Json),
            other => Err(ProtoError::InvalidJob(format!(
                "response format must be csv or json (was `{other}`)"
            ))),
        }
    }
}

/// Body of a `jobs/create` request.
///
/// A job targets either a geolevel (optionally narrowed by `geoid_list`) or a
/// portfolio, never both. `portfolio_id` and `geolevel` are always sent,
/// as `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub model_id: String,
    pub portfolio_id: Option<String>,
    pub geolevel: Option<Geolevel>,
    pub response_format: ResponseFormat,
    pub geoid_list: Vec<i64>,
    pub buffers: Vec<String>,
}

impl JobRequest {
    pub fn for_geolevel(model_id: impl Into<String>, geolevel: Geolevel) -> Self {
        Self {
            model_id: model_id.into(),
            portfolio_id: None,
            geolevel: Some(geolevel),
            response_format: ResponseFormat::default(),
            geoid_list: Vec::new(),
            buffers: Vec::new(),
        }
    }

    pub fn for_portfolio(model_id: impl Into<String>, portfolio_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            portfolio_id: Some(portfolio_id.into()),
            geolevel: None,
            response_format: ResponseFormat::default(),
            geoid_list: Vec::new(),
            buffers: Vec::new(),
        }
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_geoids(mut self, geoids: impl IntoIterator<Item = i64>) -> Self {
        self.geoid_list.extend(geoids);
        self
    }

    pub fn with_buffers<S: Into<String>>(mut self, buffers: impl IntoIterator<Item = S>) -> Self {
        self.buffers.extend(buffers.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> Result<(), ProtoError> {
        if self.model_id.is_empty() {
            return Err(ProtoError::InvalidJob("model_id must not be empty".to_string()));
        }
        let portfolio = self.portfolio_id.as_deref().filter(|id| !id.is_empty());
        match (self.geolevel, portfolio) {
            (None, None) => Err(ProtoError::InvalidJob(
                "job requires either `geolevel` or `portfolio_id`".to_string(),
            )),
            (Some(_), Some(_)) => Err(ProtoError::InvalidJob(
                "cannot have both `geolevel` and `portfolio_id`".to_string(),
            )),
            _ if self.buffers.iter().any(String::is_empty) => Err(ProtoError::InvalidJob(
                "buffer names must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Job state as reported by `jobs/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    Completed,
    /// Any other state; the job will not complete.
    Failed(String),
}

impl JobStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "Processing" => JobStatus::Processing,
            "Completed" => JobStatus::Completed,
            other => JobStatus::Failed(other.to_string()),
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Processing => f.write_str("Processing"),
            JobStatus::Completed => f.write_str("Completed"),
            JobStatus::Failed(status) => f.write_str(status),
        }
    }
}

/// Body of `jobs/status` and `jobs/download` requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef<'a> {
    pub job_id: &'a str,
}

/// A created job and the format its result will be downloaded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub response_format: ResponseFormat,
}

/// Response of the job endpoints. `message` carries the payload on success
/// (`{"job_id": ...}` or a status string) and the error otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Value,
}

impl JobResponse {
    /// Message text of a failed response.
    pub fn error_message(&self) -> String {
        match &self.message {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub fn job_id(&self) -> Result<&str, ProtoError> {
        self.message
            .get("job_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProtoError::InvalidJob(format!(
                    "create response has no job_id (message is {})",
                    json_kind(&self.message)
                ))
            })
    }

    pub fn status(&self) -> Result<JobStatus, ProtoError> {
        self.message
            .as_str()
            .map(JobStatus::parse)
            .ok_or_else(|| {
                ProtoError::InvalidJob(format!(
                    "status response message is {}, expected string",
                    json_kind(&self.message)
                ))
            })
    }
}
