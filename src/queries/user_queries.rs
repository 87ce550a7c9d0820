use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Query;
use crate::{
    client::ApiClient,
    errors::ClientError,
    models::{Role, User, UserId},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    /// Backend-side role filter, e.g. agents only for the statistics page.
    #[serde(default)]
    pub role: Option<Role>,
}

#[async_trait]
impl Query for ListUsersQuery {
    type Result = Vec<User>;

    #[instrument(skip(self, api))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing ListUsersQuery");
        let params: Vec<(&str, String)> = self
            .role
            .map(|role| vec![("role", role.to_string())])
            .unwrap_or_default();
        api.get("auth/users/", &params).await
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetUserQuery {
    pub user_id: UserId,
}

#[async_trait]
impl Query for GetUserQuery {
    type Result = User;

    #[instrument(skip(self, api), fields(user_id = self.user_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        api.get(&format!("auth/users/{}/", self.user_id), &[]).await
    }
}
