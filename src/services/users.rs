use crate::{
    client::ApiClient,
    commands::{
        users::{
            ChangeRoleCommand, CreateUserCommand, DeleteUserCommand, ResetPasswordCommand,
            UpdateUserCommand,
        },
        Command,
    },
    errors::ClientError,
    models::{NewUser, PasswordReset, Role, User, UserId, UserUpdate},
    queries::{
        user_queries::{GetUserQuery, ListUsersQuery},
        Query,
    },
};
use std::sync::Arc;
use tracing::instrument;

/// User administration, manager only
#[derive(Clone, Debug)]
pub struct UserService {
    api: Arc<ApiClient>,
}

impl UserService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, ClientError> {
        ListUsersQuery { role }.execute(&self.api).await
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ClientError> {
        GetUserQuery { user_id }.execute(&self.api).await
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, ClientError> {
        CreateUserCommand { user }.execute(&self.api).await
    }

    pub async fn update_user(&self, user_id: UserId, changes: UserUpdate) -> Result<User, ClientError> {
        UpdateUserCommand { user_id, changes }
            .execute(&self.api)
            .await
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ClientError> {
        DeleteUserCommand { user_id }.execute(&self.api).await
    }

    pub async fn change_role(&self, user_id: UserId, role: Role) -> Result<User, ClientError> {
        ChangeRoleCommand { user_id, role }.execute(&self.api).await
    }

    pub async fn reset_password(&self, user_id: UserId, password: String) -> Result<(), ClientError> {
        ResetPasswordCommand {
            user_id,
            reset: PasswordReset { password },
        }
        .execute(&self.api)
        .await
    }
}
