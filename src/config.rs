//! Tunable timeouts and poll intervals.

use std::time::Duration;

/// Connect/read/poll/timeout tunables for a [`crate::session::Session`].
#[derive(Debug, Clone)]
pub struct RetryTimeoutConfig {
    /// TCP connect timeout. Default: 10s.
    pub connect_timeout: Duration,
    /// Per-request read timeout; long enough for slow HMC operations. Default: 30 minutes.
    pub read_timeout: Duration,
    /// Interval between [`crate::status_waiter::StatusWaiter`] polls. Default: 1s.
    pub status_poll_interval: Duration,
    /// Deadline for a single status wait. Default: 60s.
    pub status_timeout: Duration,
    /// Interval between [`crate::job::Job`] completion polls. Default: 1s.
    pub job_poll_interval: Duration,
    /// Deadline for an async operation (job wait). `None` means wait forever.
    pub operation_timeout: Option<Duration>,
}

impl Default for RetryTimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30 * 60),
            status_poll_interval: Duration::from_secs(1),
            status_timeout: Duration::from_secs(60),
            job_poll_interval: Duration::from_secs(1),
            operation_timeout: None,
        }
    }
}

impl RetryTimeoutConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RetryTimeoutConfig::default();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
        assert_eq!(cfg.status_poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.status_timeout, Duration::from_secs(60));
        assert_eq!(cfg.job_poll_interval, Duration::from_secs(1));
        assert!(cfg.operation_timeout.is_none());
    }
}
