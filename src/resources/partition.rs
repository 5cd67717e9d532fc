//! Partition: a DPM-mode dynamic partition.

use crate::error::Result;
use crate::manager::{Manager, ManagerSpec};

use super::hba::Hba;
use super::nic::Nic;
use super::virtual_function::VirtualFunction;

super::resource_wrapper!(
    /// A DPM-mode partition.
    Partition
);

impl Partition {
    #[must_use]
    pub fn nics(&self) -> Manager<Nic> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "nic",
                list_uri: format!("{}/nics", self.uri()),
                members_key: "nics",
                base_uri: format!("{}/nics", self.uri()),
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
    pub fn hbas(&self) -> Manager<Hba> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "hba",
                list_uri: format!("{}/hbas", self.uri()),
                members_key: "hbas",
                base_uri: format!("{}/hbas", self.uri()),
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
    pub fn virtual_functions(&self) -> Manager<VirtualFunction> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "virtual-function",
                list_uri: format!("{}/virtual-functions", self.uri()),
                members_key: "virtual-functions",
                base_uri: format!("{}/virtual-functions", self.uri()),
                oid_prop: "element-id",
                uri_prop: "element-uri",
                name_prop: "name",
                query_props: &["name"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    /// `POST <partition-uri>/operations/start`. DPM mode only.
    pub async fn start(&self) -> Result<()> {
        let uri = format!("{}/operations/start", self.uri());
        self.session().post_and_wait(&uri, None, None).await?;
        Ok(())
    }

    /// `POST <partition-uri>/operations/stop`. DPM mode only.
    pub async fn stop(&self) -> Result<()> {
        let uri = format!("{}/operations/stop", self.uri());
        self.session().post_and_wait(&uri, None, None).await?;
        Ok(())
    }

    /// `POST <partition-uri>/operations/mount-iso-image`.
    pub async fn mount_iso_image(&self, image_name: &str, ins_file: &str) -> Result<()> {
        let uri = format!(
            "{}/operations/mount-iso-image?image-name={image_name}&ins-file-name={ins_file}",
            self.uri()
        );
        self.session().post_and_wait(&uri, None, None).await?;
        Ok(())
    }

    /// `POST <partition-uri>/operations/unmount-iso-image`.
    pub async fn unmount_iso_image(&self) -> Result<()> {
        let uri = format!("{}/operations/unmount-iso-image", self.uri());
        self.session().post_and_wait(&uri, None, None).await?;
        Ok(())
    }

    /// `POST <partition-uri>/operations/psw-restart`.
    pub async fn psw_restart(&self) -> Result<()> {
        let uri = format!("{}/operations/psw-restart", self.uri());
        self.session().post_and_wait(&uri, None, None).await?;
        Ok(())
    }
}
