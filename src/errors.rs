use reqwest::StatusCode;
use serde_json::Value;

/// Message shown when the backend gives no usable explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Une erreur est survenue. Veuillez réessayer.";

/// Message shown when the session is no longer accepted by the backend.
pub const SESSION_EXPIRED_MESSAGE: &str = "Votre session a expiré. Veuillez vous reconnecter.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error ({status}): {}", message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Session expired")]
    SessionExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(first_validation_message(&err).unwrap_or_else(|| err.to_string()))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl ClientError {
    /// Builds an API error from a status and the raw response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| extract_error_message(&value));
        ClientError::Api { status, message }
    }

    /// HTTP status carried by the error, if it came from the backend.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            ClientError::Network(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, ClientError::Superseded)
    }

    /// Text suitable for an alert region: the backend message when one was
    /// provided, a generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) | ClientError::Forbidden(msg) => msg.clone(),
            ClientError::Api {
                message: Some(msg), ..
            } => msg.clone(),
            ClientError::SessionExpired | ClientError::NotAuthenticated => {
                SESSION_EXPIRED_MESSAGE.to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Pulls a human readable message out of a backend error body.
///
/// Checked in order: `error`, `detail`, `message`, the first
/// `non_field_errors` entry, then the first message of the first field error.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }

    if let Some(text) = object.get("non_field_errors").and_then(first_string) {
        return Some(text);
    }

    object
        .iter()
        .find_map(|(field, value)| first_string(value).map(|text| format!("{field}: {text}")))
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(|item| item.as_str().map(str::to_string)),
        _ => None,
    }
}

fn first_validation_message(errors: &validator::ValidationErrors) -> Option<String> {
    errors.field_errors().iter().find_map(|(field, errs)| {
        errs.first().map(|err| match &err.message {
            Some(message) => message.to_string(),
            None => format!("{field}: {}", err.code),
        })
    })
}
