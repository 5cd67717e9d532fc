//! StorageGroup: a console-owned collection of storage volumes attached
//! to a CPC, referenced by `cpc-uri`.

use serde_json::Value;

use crate::error::{HmcError, Result};
use crate::manager::{Manager, ManagerSpec};
use crate::properties::Properties;

use super::storage_volume::StorageVolume;
use super::virtual_storage_resource::VirtualStorageResource;

super::resource_wrapper!(
    /// A storage group.
    StorageGroup
);

pub type StorageGroupManager = Manager<StorageGroup>;

impl StorageGroupManager {
    /// `POST <console>/storage-groups` with `properties`, after checking
    /// client-side that `name`/`cpc-uri`/`type` are all present — see
    /// [`require_create_properties`].
    pub async fn create_storage_group(&self, properties: Properties) -> Result<StorageGroup> {
        require_create_properties(&properties)?;
        let create_uri = self.base_uri().to_string();
        self.create(&create_uri, properties).await
    }
}

impl StorageGroup {
    #[must_use]
    pub fn storage_volumes(&self) -> Manager<StorageVolume> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "storage-volume",
                list_uri: format!("{}/storage-volumes", self.uri()),
                members_key: "storage-volumes",
                base_uri: format!("{}/storage-volumes", self.uri()),
                oid_prop: "element-id",
                uri_prop: "element-uri",
                name_prop: "name",
                query_props: &["name"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    #[must_use]
    pub fn virtual_storage_resources(&self) -> Manager<VirtualStorageResource> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "virtual-storage-resource",
                list_uri: format!("{}/virtual-storage-resources", self.uri()),
                members_key: "virtual-storage-resources",
                base_uri: format!("{}/virtual-storage-resources", self.uri()),
                oid_prop: "element-id",
                uri_prop: "element-uri",
                name_prop: "name",
                query_props: &["name"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }
}

/// Validate that `properties` carries the three fields the HMC requires
/// to create a storage group (`name`, `cpc-uri`, `type`), called from
/// [`StorageGroupManager::create_storage_group`] to surface a client-side
/// error instead of a round trip that the HMC would reject anyway.
pub fn require_create_properties(properties: &Properties) -> Result<()> {
    for key in ["name", "cpc-uri", "type"] {
        if !matches!(properties.get(key), Some(Value::String(s)) if !s.is_empty()) {
            return Err(HmcError::ClientAuthError(format!(
                "storage group creation requires a non-empty {key:?} property"
            )));
        }
    }
    Ok(())
}
