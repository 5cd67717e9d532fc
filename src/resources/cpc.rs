//! Central Processor Complex (CPC): the physical machine, and the root of
//! almost every other resource hierarchy.

use serde_json::Value;

use crate::manager::{Manager, ManagerSpec};
use crate::properties::Properties;
use crate::session::Session;

use super::activation_profile::{ActivationProfile, ActivationProfileKind};
use super::adapter::Adapter;
use super::lpar::Lpar;
use super::partition::Partition;
use super::virtual_switch::VirtualSwitch;

super::resource_wrapper!(
    /// A Central Processor Complex.
    Cpc
);

fn cpc_spec() -> ManagerSpec {
    ManagerSpec {
        class_name: "cpc",
        list_uri: "/api/cpcs".to_string(),
        members_key: "cpcs",
        base_uri: "/api/cpcs".to_string(),
        oid_prop: "object-id",
        uri_prop: "object-uri",
        name_prop: "name",
        query_props: &["name", "status", "dpm-enabled", "machine-type", "machine-model"],
        supports_properties: true,
        case_insensitive_names: false,
    }
}

/// The top-level manager for CPCs, owned by [`crate::client::Client`].
pub type CpcManager = Manager<Cpc>;

#[must_use]
pub fn cpc_manager(session: Session) -> CpcManager {
    Manager::new(session, None, cpc_spec())
}

/// One entry of an `adapter-mapping` list: old and new PCHID, as parsed
/// from the `old,new` lines `dpmConfigUtil.py --adapter-mapping` accepts.
#[derive(Debug, Clone)]
pub struct AdapterMapping {
    pub old_adapter_id: String,
    pub new_adapter_id: String,
}

impl AdapterMapping {
    fn to_value(&self) -> Value {
        serde_json::json!({
            "old-adapter-id": self.old_adapter_id,
            "new-adapter-id": self.new_adapter_id,
        })
    }
}

/// Options merged into a DPM configuration before
/// `Cpc::import_dpm_configuration` posts it, mirroring the
/// `--preserve-uris`/`--preserve-wwpns`/`--adapter-mapping` flags
/// `dpmConfigUtil.py` merges into the loaded config file.
#[derive(Debug, Clone, Default)]
pub struct ImportDpmConfigOptions {
    pub preserve_uris: bool,
    pub preserve_wwpns: bool,
    pub adapter_mapping: Vec<AdapterMapping>,
}

impl ImportDpmConfigOptions {
    fn merge_into(self, config: &mut Properties) -> crate::error::Result<()> {
        if self.preserve_uris {
            Self::insert_new_key(config, "preserve-uris", Value::Bool(true))?;
        }
        if self.preserve_wwpns {
            Self::insert_new_key(config, "preserve-wwpns", Value::Bool(true))?;
        }
        if !self.adapter_mapping.is_empty() {
            let mapping = Value::Array(self.adapter_mapping.iter().map(AdapterMapping::to_value).collect());
            Self::insert_new_key(config, "adapter-mapping", mapping)?;
        }
        Ok(())
    }

    fn insert_new_key(config: &mut Properties, key: &str, value: Value) -> crate::error::Result<()> {
        if config.contains_key(key) {
            return Err(crate::error::HmcError::ClientAuthError(format!(
                "import-dpm-configuration options use {key:?}, but config already contains that field"
            )));
        }
        config.insert(key.to_string(), value);
        Ok(())
    }
}

impl Cpc {
    #[must_use]
    pub fn partitions(&self) -> Manager<Partition> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "partition",
                list_uri: format!("{}/partitions", self.uri()),
                members_key: "partitions",
                base_uri: format!("{}/partitions", self.uri()),
                oid_prop: "object-id",
                uri_prop: "object-uri",
                name_prop: "name",
                query_props: &["name", "status", "type"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    #[must_use]
    pub fn lpars(&self) -> Manager<Lpar> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "logical-partition",
                list_uri: format!("{}/logical-partitions", self.uri()),
                members_key: "logical-partitions",
                base_uri: format!("{}/logical-partitions", self.uri()),
                oid_prop: "object-id",
                uri_prop: "object-uri",
                name_prop: "name",
                query_props: &["name", "status"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    #[must_use]
    pub fn adapters(&self) -> Manager<Adapter> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "adapter",
                list_uri: format!("{}/adapters", self.uri()),
                members_key: "adapters",
                base_uri: format!("{}/adapters", self.uri()),
                oid_prop: "object-id",
                uri_prop: "object-uri",
                name_prop: "name",
                query_props: &["name", "adapter-family", "adapter-id", "status"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    #[must_use]
    pub fn virtual_switches(&self) -> Manager<VirtualSwitch> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "virtual-switch",
                list_uri: format!("{}/virtual-switches", self.uri()),
                members_key: "virtual-switches",
                base_uri: format!("{}/virtual-switches", self.uri()),
                oid_prop: "object-id",
                uri_prop: "object-uri",
                name_prop: "name",
                query_props: &["name", "type"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    #[must_use]
    pub fn reset_activation_profiles(&self) -> Manager<ActivationProfile> {
        activation_profile_manager(self, ActivationProfileKind::Reset)
    }

    #[must_use]
    pub fn image_activation_profiles(&self) -> Manager<ActivationProfile> {
        activation_profile_manager(self, ActivationProfileKind::Image)
    }

    #[must_use]
    pub fn load_activation_profiles(&self) -> Manager<ActivationProfile> {
        activation_profile_manager(self, ActivationProfileKind::Load)
    }

    #[must_use]
    pub fn group_profiles(&self) -> Manager<ActivationProfile> {
        activation_profile_manager(self, ActivationProfileKind::Group)
    }

    /// `POST <cpc-uri>/operations/export-dpm-configuration`. `options` is
    /// forwarded verbatim; the result is the opaque DPM configuration blob
    /// `import_dpm_configuration` later consumes. `dpmConfigUtil.py` calls
    /// this with no options at all (`preserve-uris`/`preserve-wwpns`/
    /// `adapter-mapping` are import-side only).
    pub async fn export_dpm_configuration(&self, options: Properties) -> crate::error::Result<Value> {
        let uri = format!("{}/operations/export-dpm-configuration", self.uri());
        self.session()
            .post_and_wait(&uri, Some(Value::Object(options)), None)
            .await?
            .ok_or_else(|| {
                crate::error::HmcError::ConsistencyError(
                    "export-dpm-configuration returned no result".to_string(),
                )
            })
    }

    /// `POST <cpc-uri>/operations/import-dpm-configuration`. `config` is
    /// forwarded verbatim except for `options`, whose `preserve_uris`/
    /// `preserve_wwpns`/`adapter_mapping` are merged into it first — the
    /// same fields the import side of `dpmConfigUtil.py` merges into the
    /// loaded config file before posting it.
    pub async fn import_dpm_configuration(&self, config: Value, options: ImportDpmConfigOptions) -> crate::error::Result<()> {
        let Value::Object(mut body) = config else {
            return Err(crate::error::HmcError::ClientAuthError(
                "import-dpm-configuration config must be a JSON object".to_string(),
            ));
        };
        options.merge_into(&mut body)?;
        let uri = format!("{}/operations/import-dpm-configuration", self.uri());
        self.session().post_and_wait(&uri, Some(Value::Object(body)), None).await?;
        Ok(())
    }

    /// `POST <cpc-uri>/operations/install-from-ftp`.
    pub async fn install_from_ftp(&self, options: Properties) -> crate::error::Result<()> {
        let uri = format!("{}/operations/install-from-ftp", self.uri());
        self.session()
            .post_and_wait(&uri, Some(Value::Object(options)), None)
            .await?;
        Ok(())
    }
}

fn activation_profile_manager(cpc: &Cpc, kind: ActivationProfileKind) -> Manager<ActivationProfile> {
    let (segment, class_name, key) = kind.uri_parts();
    Manager::new(
        cpc.session().clone(),
        Some(cpc.uri().to_string()),
        ManagerSpec {
            class_name,
            list_uri: format!("{}/{segment}", cpc.uri()),
            members_key: key,
            base_uri: format!("{}/{segment}", cpc.uri()),
            oid_prop: "element-id",
            uri_prop: "element-uri",
            name_prop: "name",
            query_props: &["name"],
            supports_properties: true,
            case_insensitive_names: false,
        },
    )
}
