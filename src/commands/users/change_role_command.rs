use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{Role, RoleChange, User, UserId},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeRoleCommand {
    pub user_id: UserId,
    pub role: Role,
}

#[async_trait::async_trait]
impl Command for ChangeRoleCommand {
    type Result = User;

    #[instrument(skip(self, api), fields(user_id = self.user_id, role = %self.role))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        let body = RoleChange { role: self.role };
        let updated: User = api
            .patch(&format!("auth/users/{}/role/", self.user_id), &body)
            .await?;
        info!("Role changed");
        Ok(updated)
    }
}
