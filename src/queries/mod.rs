use async_trait::async_trait;

use crate::{client::ApiClient, errors::ClientError};

/// Trait representing a generic asynchronous read against the backend.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query through the shared API client
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError>;
}

pub mod dashboard_queries;
pub mod order_queries;
pub mod presta_queries;
pub mod user_queries;
