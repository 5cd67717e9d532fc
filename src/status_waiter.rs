//! Polls a resource's `status` property until it reaches an expected value.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::HmcError;
use crate::properties::PropertiesExt;
use crate::resource::Resource;

/// Poll `resource.status` every `poll_interval` until it is one of
/// `expected` (plus `"exceptions"` when `allow_status_exceptions` is true),
/// or raise [`HmcError::StatusTimeout`] after `timeout`.
pub async fn wait_for_status(
    resource: &Resource,
    expected: &[&str],
    allow_status_exceptions: bool,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<String, HmcError> {
    let mut accepted: HashSet<&str> = expected.iter().copied().collect();
    if allow_status_exceptions {
        accepted.insert("exceptions");
    }

    let start = Instant::now();
    loop {
        resource.pull_full_properties().await?;
        let status = resource.properties().await.get_str("status").map(str::to_string);
        let status = status.unwrap_or_else(|_| "unknown".to_string());

        if accepted.contains(status.as_str()) {
            return Ok(status);
        }

        if start.elapsed() >= timeout {
            return Err(HmcError::StatusTimeout {
                resource_uri: resource.uri().to_string(),
                actual: status,
                expected: accepted.iter().map(|s| (*s).to_string()).collect(),
                timeout,
            });
        }

        trace!(uri = resource.uri(), status, "status wait: not yet at expected status");
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    // Exercised end-to-end in tests/lpar_lifecycle.rs against the fake HMC,
    // since "status" is only observable through a GET round-trip.
}
