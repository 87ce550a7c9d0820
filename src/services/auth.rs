use crate::{
    auth::{CredentialProvider, Session},
    client::ApiClient,
    errors::ClientError,
    models::{Credentials, LoginResponse, Role, TokenRefreshResponse, User},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

/// Login, token refresh and logout, all through the shared credential provider
#[derive(Clone, Debug)]
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    fn credentials(&self) -> &Arc<CredentialProvider> {
        self.api.credentials()
    }

    /// Exchanges credentials for tokens and stores the resulting session.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session, ClientError> {
        credentials.validate().map_err(|e| {
            error!("Invalid login input: {}", e);
            ClientError::from(e)
        })?;

        let response: LoginResponse = self.api.post_anonymous("auth/login/", &credentials).await?;
        let session = Session::new(response.access, response.refresh, response.user);
        self.credentials().install(session.clone())?;

        info!(
            user_id = session.user.as_ref().map(|u| u.id),
            "User authenticated"
        );
        Ok(session)
    }

    /// Trades the stored refresh token for a new access token.
    ///
    /// A rejected refresh ends the session. Transport failures leave it intact.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Session, ClientError> {
        let refresh_token = self
            .credentials()
            .refresh_token()
            .ok_or(ClientError::NotAuthenticated)?;

        let response: TokenRefreshResponse = match self
            .api
            .post_anonymous("auth/token/refresh/", &json!({ "refresh": refresh_token }))
            .await
        {
            Ok(response) => response,
            Err(err @ ClientError::Api { .. }) => {
                warn!(error = %err, "Token refresh rejected, logging out");
                self.credentials().invalidate();
                return Err(ClientError::SessionExpired);
            }
            Err(err) => return Err(err),
        };

        self.credentials()
            .update_access_token(response.access, response.refresh)?;
        info!("Access token refreshed");
        self.credentials()
            .session()
            .ok_or(ClientError::NotAuthenticated)
    }

    pub fn logout(&self) {
        self.credentials().invalidate();
    }

    /// The user cached at login.
    pub fn whoami(&self) -> Result<User, ClientError> {
        self.credentials()
            .current_user()
            .ok_or(ClientError::NotAuthenticated)
    }

    pub fn current_role(&self) -> Result<Role, ClientError> {
        self.whoami().map(|user| user.role)
    }
}
