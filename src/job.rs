//! Async HMC job handling.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::trace;

use crate::error::HmcError;
use crate::session::Session;

/// One outstanding HMC async job, identified by its `job-uri`.
pub struct Job {
    session: Session,
    job_uri: String,
    origin_method: &'static str,
    origin_uri: String,
}

/// The outcome of one completion check.
#[derive(Debug, Clone)]
pub enum JobStatus {
    Running,
    Complete(Option<Value>),
}

impl Job {
    #[must_use]
    pub fn new(session: Session, job_uri: String, origin_method: &'static str, origin_uri: &str) -> Self {
        Self {
            session,
            job_uri,
            origin_method,
            origin_uri: origin_uri.to_string(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.job_uri
    }

    /// `GET job-uri` once. Returns `Running` while `status != "complete"`;
    /// on completion, raises [`HmcError::HttpError`] if
    /// `job-status-code` is outside `[200, 400)`, deleting the job resource
    /// either way.
    pub async fn check_for_completion(&self) -> Result<JobStatus, HmcError> {
        let body = self.session.get(&self.job_uri, true, true).await?;
        let status = body.get("status").and_then(Value::as_str).unwrap_or("running");
        if status != "complete" {
            return Ok(JobStatus::Running);
        }

        let job_status_code = body
            .get("job-status-code")
            .and_then(Value::as_u64)
            .unwrap_or(200);
        let job_reason_code = body.get("job-reason-code").and_then(Value::as_i64);
        let job_results = body.get("job-results").cloned();

        // The job resource is released regardless of success/failure, matching
        // the source's "complete" handling.
        let _ = self.session.delete(&self.job_uri, true).await;

        if (200..400).contains(&job_status_code) {
            Ok(JobStatus::Complete(job_results))
        } else {
            let message = job_results
                .as_ref()
                .and_then(|r| r.get("error").or_else(|| r.get("message")))
                .and_then(Value::as_str)
                .map(str::to_string);
            Err(HmcError::http_error(
                u16::try_from(job_status_code).unwrap_or(500),
                job_reason_code,
                message,
                &self.origin_uri,
                self.origin_method,
            ))
        }
    }

    /// Poll [`Self::check_for_completion`] at the session's configured
    /// job-poll interval until the job completes or `operation_timeout`
    /// elapses. Completion always takes priority over timeout: the final
    /// poll that observes completion is returned even if it landed after
    /// the deadline.
    pub async fn wait_for_completion(
        &self,
        operation_timeout: Option<Duration>,
    ) -> Result<Option<Value>, HmcError> {
        let start = Instant::now();
        let poll_interval = self.session.retry_timeout_config().job_poll_interval;

        loop {
            match self.check_for_completion().await? {
                JobStatus::Complete(result) => return Ok(result),
                JobStatus::Running => {
                    trace!(job_uri = %self.job_uri, "job still running");
                }
            }

            if let Some(timeout) = operation_timeout {
                if start.elapsed() >= timeout {
                    // One last check: completion takes priority over timeout.
                    if let JobStatus::Complete(result) = self.check_for_completion().await? {
                        return Ok(result);
                    }
                    return Err(HmcError::OperationTimeout {
                        job_uri: self.job_uri.clone(),
                        timeout,
                    });
                }
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// `DELETE job-uri`, cancelling a still-running job.
    pub async fn cancel(&self) -> Result<(), HmcError> {
        self.session.delete(&self.job_uri, true).await
    }
}

#[cfg(test)]
mod tests {
    // Job behavior is exercised end-to-end against the fake HMC in
    // `tests/lpar_lifecycle.rs` and `tests/session_renewal.rs`, since it is
    // inseparable from Session's HTTP semantics.
}
