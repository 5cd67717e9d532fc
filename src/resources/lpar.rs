//! Lpar: a classic-mode logical partition.

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::properties::Properties;
use crate::status_waiter::wait_for_status;

super::resource_wrapper!(
    /// A classic-mode logical partition.
    Lpar
);

/// The outcome of a load-family operation: whatever `job-results` the HMC
/// returned, if any.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    pub job_results: Option<Value>,
}

struct StatusWaitArgs {
    allow_status_exceptions: bool,
    operation_timeout: Option<Duration>,
    status_timeout: Option<Duration>,
}

impl Lpar {
    async fn post_operation(&self, verb: &str, body: Map<String, Value>, operation_timeout: Option<Duration>) -> Result<Option<Value>> {
        let uri = format!("{}/operations/{verb}", self.uri());
        self.session()
            .post_and_wait(&uri, Some(Value::Object(body)), operation_timeout)
            .await
    }

    async fn wait_for_one_of(
        &self,
        expected: &[&str],
        args: &StatusWaitArgs,
    ) -> Result<String> {
        let poll_interval = self.session().retry_timeout_config().status_poll_interval;
        let timeout = args
            .status_timeout
            .unwrap_or(self.session().retry_timeout_config().status_timeout);
        wait_for_status(self, expected, args.allow_status_exceptions, poll_interval, timeout).await
    }

    /// `POST …/operations/activate`; waits for the job, then for status
    /// to reach `operating` or `not-operating` (the LPAR may come up with
    /// no OS loaded yet).
    pub async fn activate(
        &self,
        activation_profile_name: Option<&str>,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<()> {
        let mut body = Map::new();
        if let Some(name) = activation_profile_name {
            body.insert("activation-profile-name".to_string(), json!(name));
        }
        if force {
            body.insert("force".to_string(), json!(true));
        }
        self.post_operation("activate", body, operation_timeout).await?;
        self.wait_for_one_of(
            &["operating", "not-operating"],
            &StatusWaitArgs {
                allow_status_exceptions,
                operation_timeout,
                status_timeout,
            },
        )
        .await?;
        Ok(())
    }

    /// `POST …/operations/deactivate`; waits for status `not-operating`.
    pub async fn deactivate(
        &self,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<()> {
        let mut body = Map::new();
        if force {
            body.insert("force".to_string(), json!(true));
        }
        self.post_operation("deactivate", body, operation_timeout).await?;
        self.wait_for_one_of(
            &["not-activated"],
            &StatusWaitArgs {
                allow_status_exceptions,
                operation_timeout,
                status_timeout,
            },
        )
        .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn load_family(
        &self,
        verb: &str,
        last_used_load_type: &str,
        load_address: &str,
        load_parameter: Option<&str>,
        mut body: Map<String, Value>,
        clear_indicator: bool,
        store_status_indicator: bool,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        if force {
            body.insert("force".to_string(), json!(true));
        }
        body.insert("clear-indicator".to_string(), json!(clear_indicator));
        body.insert(
            "store-status-indicator".to_string(),
            json!(store_status_indicator),
        );

        let current_status = self
            .prop("status")
            .await?
            .and_then(|v| v.as_str().map(str::to_string));
        let pre_load_status = if store_status_indicator && current_status.as_deref() == Some("operating") {
            current_status.clone()
        } else {
            None
        };

        let job_results = self.post_operation(verb, body, operation_timeout).await?;

        self.wait_for_one_of(
            &["operating"],
            &StatusWaitArgs {
                allow_status_exceptions,
                operation_timeout,
                status_timeout,
            },
        )
        .await?;

        // The HMC always records these after a successful load/dump,
        // regardless of whether push-notification auto-update is on for
        // this resource, so bookkeeping goes through merge_local_properties
        // rather than apply_auto_update.
        let mut updates = Properties::new();
        updates.insert("last-used-load-type".to_string(), json!(last_used_load_type));
        updates.insert("last-used-load-address".to_string(), json!(load_address));
        updates.insert(
            "last-used-load-parameter".to_string(),
            load_parameter.map_or(Value::Null, |p| json!(p)),
        );
        if clear_indicator {
            updates.insert("memory".to_string(), json!(""));
        }
        if let Some(stored) = pre_load_status {
            updates.insert("stored-status".to_string(), json!(stored));
        }
        self.merge_local_properties(updates).await;

        Ok(LoadResult { job_results })
    }

    /// Standard `load`: `load_address`/`load_parameter` over the
    /// configured load device.
    #[allow(clippy::too_many_arguments)]
    pub async fn load(
        &self,
        load_address: &str,
        load_parameter: Option<&str>,
        clear_indicator: bool,
        store_status_indicator: bool,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        let mut body = Map::new();
        body.insert("load-address".to_string(), json!(load_address));
        if let Some(param) = load_parameter {
            body.insert("load-parameter".to_string(), json!(param));
        }
        self.load_family(
            "load",
            "ipltype-standard",
            load_address,
            load_parameter,
            body,
            clear_indicator,
            store_status_indicator,
            force,
            allow_status_exceptions,
            operation_timeout,
            status_timeout,
        )
        .await
    }

    /// SCSI load: requires `wwpn`/`lun` in addition to `load_address`.
    #[allow(clippy::too_many_arguments)]
    pub async fn scsi_load(
        &self,
        load_address: &str,
        wwpn: &str,
        lun: &str,
        clear_indicator: bool,
        store_status_indicator: bool,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        let mut body = Map::new();
        body.insert("load-address".to_string(), json!(load_address));
        body.insert("world-wide-port-name".to_string(), json!(wwpn));
        body.insert("logical-unit-number".to_string(), json!(lun));
        self.load_family(
            "scsi-load",
            "ipltype-scsi",
            load_address,
            None,
            body,
            clear_indicator,
            store_status_indicator,
            force,
            allow_status_exceptions,
            operation_timeout,
            status_timeout,
        )
        .await
    }

    /// SCSI dump: same inputs as `scsi_load`, different `last-used-load-type`.
    #[allow(clippy::too_many_arguments)]
    pub async fn scsi_dump(
        &self,
        load_address: &str,
        wwpn: &str,
        lun: &str,
        clear_indicator: bool,
        store_status_indicator: bool,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        let mut body = Map::new();
        body.insert("load-address".to_string(), json!(load_address));
        body.insert("world-wide-port-name".to_string(), json!(wwpn));
        body.insert("logical-unit-number".to_string(), json!(lun));
        self.load_family(
            "scsi-dump",
            "ipltype-scsidump",
            load_address,
            None,
            body,
            clear_indicator,
            store_status_indicator,
            force,
            allow_status_exceptions,
            operation_timeout,
            status_timeout,
        )
        .await
    }

    /// NVMe load: only `load_address` is required.
    #[allow(clippy::too_many_arguments)]
    pub async fn nvme_load(
        &self,
        load_address: &str,
        clear_indicator: bool,
        store_status_indicator: bool,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        let mut body = Map::new();
        body.insert("load-address".to_string(), json!(load_address));
        self.load_family(
            "nvme-load",
            "ipltype-nvme",
            load_address,
            None,
            body,
            clear_indicator,
            store_status_indicator,
            force,
            allow_status_exceptions,
            operation_timeout,
            status_timeout,
        )
        .await
    }

    /// NVMe dump: same inputs as `nvme_load`, different `last-used-load-type`.
    #[allow(clippy::too_many_arguments)]
    pub async fn nvme_dump(
        &self,
        load_address: &str,
        clear_indicator: bool,
        store_status_indicator: bool,
        force: bool,
        allow_status_exceptions: bool,
        operation_timeout: Option<Duration>,
        status_timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        let mut body = Map::new();
        body.insert("load-address".to_string(), json!(load_address));
        self.load_family(
            "nvme-dump",
            "ipltype-nvmedump",
            load_address,
            None,
            body,
            clear_indicator,
            store_status_indicator,
            force,
            allow_status_exceptions,
            operation_timeout,
            status_timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    // Activate/deactivate/load sequencing is exercised end-to-end in
    // tests/lpar_lifecycle.rs against the fake HMC: these methods are
    // inseparable from Session/Job/StatusWaiter's network behavior.
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn load_result_default_has_no_job_results() {
        let result = LoadResult::default();
        assert!(result.job_results.is_none());
    }
}
