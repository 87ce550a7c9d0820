use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{NewUser, User},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub user: NewUser,
}

#[async_trait::async_trait]
impl Command for CreateUserCommand {
    type Result = User;

    #[instrument(skip(self, api), fields(username = %self.user.username, role = %self.user.role))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        self.user.validate().map_err(|e| {
            error!("Invalid user input: {}", e);
            ClientError::from(e)
        })?;

        let created: User = api.post("auth/users/", &self.user).await?;
        info!(user_id = created.id, "User created");
        Ok(created)
    }
}
