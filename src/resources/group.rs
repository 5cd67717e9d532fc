//! Group: a console-defined collection of arbitrary resources, used to
//! scope bulk operations and permissions.

use serde_json::json;

use crate::error::Result;

super::resource_wrapper!(
    /// A console-defined group of resources.
    Group
);

impl Group {
    /// `POST <group-uri>/operations/add-member` with the member's URI.
    pub async fn add_member(&self, member_uri: &str) -> Result<()> {
        let uri = format!("{}/operations/add-member", self.uri());
        let body = json!({"object-uri": member_uri});
        self.session().post_and_wait(&uri, Some(body), None).await?;
        Ok(())
    }

    /// `POST <group-uri>/operations/remove-member` with the member's URI.
    pub async fn remove_member(&self, member_uri: &str) -> Result<()> {
        let uri = format!("{}/operations/remove-member", self.uri());
        let body = json!({"object-uri": member_uri});
        self.session().post_and_wait(&uri, Some(body), None).await?;
        Ok(())
    }
}
