use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{PasswordReset, UserId},
};
use serde::Serialize;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ResetPasswordCommand {
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub reset: PasswordReset,
}

#[async_trait::async_trait]
impl Command for ResetPasswordCommand {
    type Result = ();

    #[instrument(skip(self, api), fields(user_id = self.user_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        self.reset.validate().map_err(|e| {
            error!("Invalid password: {}", e);
            ClientError::from(e)
        })?;

        api.post::<_, Option<serde_json::Value>>(
            &format!("auth/users/{}/reset-password/", self.user_id),
            &self.reset,
        )
        .await?;
        info!("Password reset");
        Ok(())
    }
}
