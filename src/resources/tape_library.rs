//! TapeLibrary: a console-owned tape library attached to a CPC's FCP
//! fabric.

use serde_json::Value;

use crate::error::Result;
use crate::manager::{Manager, ManagerSpec};
use crate::properties::Properties;

use super::tape_link::TapeLink;

super::resource_wrapper!(
    /// A tape library.
    TapeLibrary
);

impl TapeLibrary {
    #[must_use]
    pub fn tape_links(&self) -> Manager<TapeLink> {
        Manager::new(
            self.session().clone(),
            Some(self.uri().to_string()),
            ManagerSpec {
                class_name: "tape-link",
                list_uri: format!("{}/tape-links", self.uri()),
                members_key: "tape-links",
                base_uri: format!("{}/tape-links", self.uri()),
                oid_prop: "element-id",
                uri_prop: "element-uri",
                name_prop: "name",
                query_props: &["name"],
                supports_properties: true,
                case_insensitive_names: false,
            },
        )
    }

    /// `POST <tape-library-uri>/operations/request-zoning`. The HMC fails
    /// this with `HTTPError{409,487}` unless the parent CPC has at least
    /// one FCP adapter.
    pub async fn request_zoning(&self, properties: Properties) -> Result<()> {
        let uri = format!("{}/operations/request-zoning", self.uri());
        self.session()
            .post_and_wait(&uri, Some(Value::Object(properties)), None)
            .await?;
        Ok(())
    }

    /// `POST <tape-library-uri>/operations/discover`. The HMC fails this
    /// with `HTTPError{409,501}` unless the CPC has a
    /// `management-world-wide-port-name` set.
    pub async fn discover(&self, properties: Properties) -> Result<()> {
        let uri = format!("{}/operations/discover", self.uri());
        self.session()
            .post_and_wait(&uri, Some(Value::Object(properties)), None)
            .await?;
        Ok(())
    }
}
