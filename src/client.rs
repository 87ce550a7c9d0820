//! The one HTTP wrapper every service goes through.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::CredentialProvider;
use crate::config::AppConfig;
use crate::errors::ClientError;

const USER_AGENT: &str = concat!("orderflow/", env!("CARGO_PKG_VERSION"));

/// REST client bound to one backend and one credential provider.
///
/// Authenticated calls carry `Authorization: Bearer <token>`. A 401 on such a
/// call invalidates the session and surfaces as [`ClientError::SessionExpired`];
/// the request is never retried.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<CredentialProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        credentials: Arc<CredentialProvider>,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: normalize_base(base_url)?,
            credentials,
        })
    }

    pub fn from_config(
        config: &AppConfig,
        credentials: Arc<CredentialProvider>,
    ) -> Result<Self, ClientError> {
        Self::new(&config.api_base_url, config.request_timeout(), credentials)
    }

    pub fn credentials(&self) -> &Arc<CredentialProvider> {
        &self.credentials
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a path relative to the API root, e.g. `orders/12/pack/`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path)?.query(query);
        self.send(request, true).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(request, true).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path)?.json(body);
        self.send(request, true).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path)?.json(body);
        self.send(request, true).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, path)?;
        self.send::<Option<serde_json::Value>>(request, true)
            .await
            .map(|_| ())
    }

    /// POST without a bearer token, for login and token refresh.
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(request, false).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(path)?;
        Ok(self.http.request(method, url))
    }

    #[instrument(skip(self, request))]
    async fn send<T>(&self, request: RequestBuilder, authenticated: bool) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = if authenticated {
            let token = self
                .credentials
                .access_token()
                .ok_or(ClientError::NotAuthenticated)?;
            request.bearer_auth(token)
        } else {
            request
        };

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response was received");
            ClientError::Network(e)
        })?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED && authenticated {
            warn!(%url, "Backend rejected the access token, logging out");
            self.credentials.invalidate();
            return Err(ClientError::SessionExpired);
        }

        if !status.is_success() {
            let err = ClientError::from_response(status, &body);
            warn!(%url, status = status.as_u16(), error = %err, "Backend returned an error");
            return Err(err);
        }

        decode_body(&body)
    }
}

fn normalize_base(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "unsupported API scheme '{other}'"
        ))),
    }
}

/// Empty bodies (204, bare 200) decode as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let trimmed = body.trim();
    let source = if trimmed.is_empty() { "null" } else { trimmed };
    Ok(serde_json::from_str(source)?)
}
