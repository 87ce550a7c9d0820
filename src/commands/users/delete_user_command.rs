use crate::{client::ApiClient, commands::Command, errors::ClientError, models::UserId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub user_id: UserId,
}

#[async_trait::async_trait]
impl Command for DeleteUserCommand {
    type Result = ();

    #[instrument(skip(self, api), fields(user_id = self.user_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        api.delete(&format!("auth/users/{}/", self.user_id)).await?;
        info!("User deleted");
        Ok(())
    }
}
