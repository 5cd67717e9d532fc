//! Client: the top-level entry point. Owns the [`Session`] and the
//! root-level managers (`cpcs`, `consoles`, `metrics_contexts`), and
//! exposes the handful of operations that aren't scoped to any one
//! resource (`GET /api/version`, bulk inventory fetch).

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{HmcError, Result};
use crate::manager::Manager;
use crate::resources::console::{Console, console_manager};
use crate::resources::cpc::{CpcManager, cpc_manager};
use crate::resources::metrics_context::{MetricsContextManager, metrics_context_manager};
use crate::session::Session;

/// API version information reported by `GET /api/version`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiVersionInfo {
    pub api_major_version: i64,
    pub api_minor_version: i64,
    pub hmc_version: String,
    pub hmc_name: String,
}

/// The resource kinds [`Client::get_inventory`] can be asked to fetch.
/// Maps to the HMC's inventory-operation resource class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cpc,
    Partition,
    Lpar,
    Adapter,
    Port,
    Nic,
    Hba,
    VirtualFunction,
    VirtualSwitch,
    StorageGroup,
    StorageVolume,
    VirtualStorageResource,
    Console,
    User,
    UserRole,
    UserPattern,
    PasswordRule,
    LdapServerDefinition,
    HwMessage,
    Group,
    TapeLibrary,
    TapeLink,
}

impl ResourceKind {
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Cpc => "cpc",
            Self::Partition => "partition",
            Self::Lpar => "logical-partition",
            Self::Adapter => "adapter",
            Self::Port => "port",
            Self::Nic => "nic",
            Self::Hba => "hba",
            Self::VirtualFunction => "virtual-function",
            Self::VirtualSwitch => "virtual-switch",
            Self::StorageGroup => "storage-group",
            Self::StorageVolume => "storage-volume",
            Self::VirtualStorageResource => "virtual-storage-resource",
            Self::Console => "console",
            Self::User => "user",
            Self::UserRole => "user-role",
            Self::UserPattern => "user-pattern",
            Self::PasswordRule => "password-rule",
            Self::LdapServerDefinition => "ldap-server-definition",
            Self::HwMessage => "hw-message",
            Self::Group => "group",
            Self::TapeLibrary => "tape-library",
            Self::TapeLink => "tape-link",
        }
    }
}

/// One raw resource record returned by [`Client::get_inventory`]. Inventory
/// results span heterogeneous resource kinds in a single response, so
/// records are kept as property bags rather than materialized into the
/// per-kind wrapper types; callers that need a live handle should
/// `resource_object` them through the matching manager.
pub type InventoryRecord = serde_json::Map<String, Value>;

/// Top-level client owning a [`Session`] and the root managers.
#[derive(Clone)]
pub struct Client {
    session: Session,
    cpcs: CpcManager,
    consoles: Manager<Console>,
    metrics_contexts: MetricsContextManager,
    api_version_cache: std::sync::Arc<RwLock<Option<ApiVersionInfo>>>,
}

impl Client {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            cpcs: cpc_manager(session.clone()),
            consoles: console_manager(session.clone()),
            metrics_contexts: metrics_context_manager(session.clone()),
            session,
            api_version_cache: std::sync::Arc::new(RwLock::new(None)),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn cpcs(&self) -> &CpcManager {
        &self.cpcs
    }

    #[must_use]
    pub fn consoles(&self) -> &Manager<Console> {
        &self.consoles
    }

    #[must_use]
    pub fn metrics_contexts(&self) -> &MetricsContextManager {
        &self.metrics_contexts
    }

    /// The console singleton. The HMC always exposes exactly one, at
    /// `/api/console`.
    #[must_use]
    pub fn console_object(&self) -> Console {
        self.consoles.resource_object("/api/console", None)
    }

    /// `GET /api/version`, parsed into `{api-major-version,
    /// api-minor-version, hmc-version, hmc-name}`. Cached after the first
    /// successful call, since it never changes within a session's lifetime.
    pub async fn query_api_version(&self) -> Result<ApiVersionInfo> {
        if let Some(cached) = self.api_version_cache.read().await.clone() {
            return Ok(cached);
        }
        let body = self.session.get("/api/version", false, true).await?;
        let info = parse_api_version_info(&body)?;
        *self.api_version_cache.write().await = Some(info.clone());
        Ok(info)
    }

    /// `(api-major-version, api-minor-version)`, as a numeric tuple.
    pub async fn version_info(&self) -> Result<(i64, i64)> {
        let info = self.query_api_version().await?;
        Ok((info.api_major_version, info.api_minor_version))
    }

    /// `POST /api/services/inventory` with `{"resources": [...]}`, returning
    /// the raw per-resource property bags the HMC reports across all
    /// requested kinds in one round trip.
    pub async fn get_inventory(&self, resource_kinds: &[ResourceKind]) -> Result<Vec<InventoryRecord>> {
        let resources: Vec<Value> = resource_kinds
            .iter()
            .map(|k| Value::String(k.class_name().to_string()))
            .collect();
        let body = serde_json::json!({ "resources": resources });
        let response = self
            .session
            .post_and_wait("/api/services/inventory", Some(body), None)
            .await?;
        let Some(response) = response else {
            return Ok(Vec::new());
        };
        let records = response
            .get("resources")
            .and_then(Value::as_array)
            .or_else(|| response.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_object().cloned()).collect())
            .unwrap_or_default();
        Ok(records)
    }
}

fn parse_api_version_info(body: &Value) -> Result<ApiVersionInfo> {
    let api_major_version = body
        .get("api-major-version")
        .and_then(Value::as_i64)
        .ok_or_else(|| HmcError::ConsistencyError("api/version missing api-major-version".to_string()))?;
    let api_minor_version = body
        .get("api-minor-version")
        .and_then(Value::as_i64)
        .ok_or_else(|| HmcError::ConsistencyError("api/version missing api-minor-version".to_string()))?;
    let hmc_version = body
        .get("hmc-version")
        .and_then(Value::as_str)
        .ok_or_else(|| HmcError::ConsistencyError("api/version missing hmc-version".to_string()))?
        .to_string();
    let hmc_name = body
        .get("hmc-name")
        .and_then(Value::as_str)
        .ok_or_else(|| HmcError::ConsistencyError("api/version missing hmc-name".to_string()))?
        .to_string();
    Ok(ApiVersionInfo {
        api_major_version,
        api_minor_version,
        hmc_version,
        hmc_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_api_version_body() {
        let body = json!({
            "api-major-version": 2,
            "api-minor-version": 20,
            "hmc-version": "2.14.0",
            "hmc-name": "fake-hmc",
        });
        let info = parse_api_version_info(&body).unwrap();
        assert_eq!(info.api_major_version, 2);
        assert_eq!(info.api_minor_version, 20);
        assert_eq!(info.hmc_version, "2.14.0");
        assert_eq!(info.hmc_name, "fake-hmc");
    }

    #[test]
    fn missing_field_is_a_consistency_error() {
        let body = json!({"api-major-version": 2});
        assert!(parse_api_version_info(&body).is_err());
    }

    #[test]
    fn resource_kind_class_names_are_kebab_case() {
        assert_eq!(ResourceKind::Lpar.class_name(), "logical-partition");
        assert_eq!(ResourceKind::VirtualSwitch.class_name(), "virtual-switch");
    }
}
