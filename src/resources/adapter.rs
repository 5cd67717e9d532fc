//! Adapter: a physical or virtual I/O adapter (OSA, FICON/FCP, RoCE, ...).

use serde_json::{Value, json};

use crate::error::Result;
use crate::manager::{Manager, ManagerSpec};

use super::port::Port;

super::resource_wrapper!(
    /// An I/O adapter.
    Adapter
);

impl Adapter {
    #[must_use]
    pub fn ports(&self) -> Manager<Port> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "port",
                list_uri: format!("{}/ports", self.uri()),
                members_key: "ports",
                base_uri: format!("{}/ports", self.uri()),
                oid_prop: "element-id",
                uri_prop: "element-uri",
                name_prop: "name",
                query_props: &["name"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    /// `POST <adapter-uri>/operations/change-adapter-type`. FICON family
    /// only; an identity change (new type == current type) fails with
    /// `HTTPError{400,8}`; non-FICON adapters fail with `HTTPError{400,18}`
    /// (both are HMC-side checks, surfaced verbatim through `post_and_wait`).
    pub async fn change_adapter_type(&self, new_type: &str) -> Result<()> {
        let uri = format!("{}/operations/change-adapter-type", self.uri());
        let body = json!({"type": new_type});
        self.session().post_and_wait(&uri, Some(body), None).await?;
        Ok(())
    }

    /// `POST <adapter-uri>/operations/export-port-names-list`.
    pub async fn export_port_names_list(&self) -> Result<Vec<String>> {
        let uri = format!("{}/operations/export-port-names-list", self.uri());
        let result = self.session().post_and_wait(&uri, None, None).await?;
        Ok(result
            .as_ref()
            .and_then(|v| v.get("port-names-list"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }
}
