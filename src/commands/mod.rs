use crate::{client::ApiClient, errors::ClientError};
use async_trait::async_trait;

/// Command trait for implementing the Command Pattern
///
/// A command validates its own input before anything is sent, then performs
/// exactly one mutating round trip. The backend's answer is returned as is;
/// commands never compute the resulting state locally and never retry.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command against the backend
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError>;
}

pub mod orders;
pub mod users;
