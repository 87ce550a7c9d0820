use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{User, UserId, UserUpdate},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserCommand {
    pub user_id: UserId,
    pub changes: UserUpdate,
}

#[async_trait::async_trait]
impl Command for UpdateUserCommand {
    type Result = User;

    #[instrument(skip(self, api), fields(user_id = self.user_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        self.changes.validate().map_err(|e| {
            error!("Invalid user update: {}", e);
            ClientError::from(e)
        })?;

        let updated: User = api
            .put(&format!("auth/users/{}/", self.user_id), &self.changes)
            .await?;
        info!("User updated");
        Ok(updated)
    }
}
