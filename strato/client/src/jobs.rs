//! Long-running jobs: create a job, poll its status, download the result.
//!
//! Every request carries the API token as a `Bearer` authorization header and
//! goes to `{jobs_endpoint}/create`, `/status` or `/download`.

use std::time::Duration;

use strato_proto::prelude::*;

use crate::client::Client;
use crate::error::{QueryError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_POLLS: u32 = 100;

/// Runs jobs against the job pipeline with one token.
#[derive(Debug, Clone)]
pub struct JobRunner {
    client: Client,
    token: ApiToken,
    poll_interval: Duration,
    max_polls: u32,
}

impl JobRunner {
    pub fn new(client: Client, token: impl Into<ApiToken>) -> Self {
        Self {
            client,
            token: token.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    fn url(&self, action: &str) -> String {
        format!(
            "{}/{action}",
            self.client.config().jobs_endpoint.trim_end_matches('/')
        )
    }

    fn call<B: serde::Serialize>(&self, action: &str, body: &B) -> Result<JobResponse> {
        let bytes = self
            .client
            .send_json(&self.url(action), body, Some(&self.token))?;
        let response: JobResponse = serde_json::from_slice(&bytes)?;
        if !response.success {
            let message = response.error_message();
            log::warn!("Job {action} rejected by API: {message}");
            return Err(QueryError::Api(message));
        }
        Ok(response)
    }

    /// Validate and submit a job request.
    pub fn create(&self, request: &JobRequest) -> Result<JobHandle> {
        request.validate().map_err(QueryError::InvalidRequest)?;
        log::info!("Creating job for model {}", request.model_id);
        let response = self.call("create", request)?;
        let job_id = response.job_id()?.to_string();
        log::debug!("Created job {job_id}");
        Ok(JobHandle {
            job_id,
            response_format: request.response_format,
        })
    }

    pub fn status(&self, job: &JobHandle) -> Result<JobStatus> {
        let response = self.call("status", &JobRef { job_id: &job.job_id })?;
        Ok(response.status()?)
    }

    /// Download a finished job and read it in the format it was created with.
    pub fn download(&self, job: &JobHandle) -> Result<Table> {
        let bytes = self.client.send_json(
            &self.url("download"),
            &JobRef { job_id: &job.job_id },
            Some(&self.token),
        )?;
        log::debug!("Downloaded {} bytes for job {}", bytes.len(), job.job_id);
        let table = match job.response_format {
            ResponseFormat::Csv => Table::from_csv(&bytes)?,
            ResponseFormat::Json => {
                let data: serde_json::Value = serde_json::from_slice(&bytes)?;
                Table::from_json(&data)?
            }
        };
        if self.client.config().uppercase_columns {
            Ok(table.with_uppercase_names()?)
        } else {
            Ok(table)
        }
    }

    /// Create a job, poll until it completes and download its result.
    ///
    /// Fails as soon as the job reports a state other than `Processing` or
    /// `Completed`, or after `max_polls` status checks.
    pub fn run(&self, request: &JobRequest) -> Result<Table> {
        let job = self.create(request)?;
        for poll in 1..=self.max_polls {
            match self.status(&job)? {
                JobStatus::Completed => return self.download(&job),
                JobStatus::Processing => {
                    log::debug!("Job {} still processing (check {poll})", job.job_id);
                    if poll < self.max_polls {
                        std::thread::sleep(self.poll_interval);
                    }
                }
                JobStatus::Failed(status) => {
                    log::warn!("Job {} failed with status {status}", job.job_id);
                    return Err(QueryError::JobFailed(status));
                }
            }
        }
        Err(QueryError::JobIncomplete {
            polls: self.max_polls,
        })
    }
}
