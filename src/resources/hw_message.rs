//! HwMessage: a hardware message raised against a CPC or one of its
//! partitions, surfaced under the console.

use crate::error::Result;

super::resource_wrapper!(
    /// A hardware message.
    HwMessage
);

impl HwMessage {
    /// `POST <hw-message-uri>/operations/request-service`, asking the
    /// support organization to action the underlying hardware problem.
    pub async fn request_service(&self) -> Result<()> {
        let uri = format!("{}/operations/request-service", self.uri());
        self.session().post_and_wait(&uri, None, None).await?;
        Ok(())
    }
}
