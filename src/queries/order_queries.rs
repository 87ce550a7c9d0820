use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Query;
use crate::{
    client::ApiClient,
    errors::ClientError,
    models::{DateFilter, Order, OrderId, Stage},
};

pub const EMPTY_REFERENCE_MESSAGE: &str = "Veuillez entrer une référence de commande";

/// Orders waiting for one stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListStageOrdersQuery {
    pub stage: Stage,
    /// Preparation only: restrict to orders created by the caller.
    #[serde(default)]
    pub creator_only: bool,
    #[serde(default)]
    pub date: Option<DateFilter>,
}

impl ListStageOrdersQuery {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            creator_only: false,
            date: None,
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.creator_only && self.stage == Stage::Preparation {
            params.push(("creator_only", "true".to_string()));
        }
        if let Some(date) = &self.date {
            params.extend(date.query_pairs());
        }
        params
    }
}

#[async_trait]
impl Query for ListStageOrdersQuery {
    type Result = Vec<Order>;

    #[instrument(skip(self, api), fields(stage = %self.stage))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing ListStageOrdersQuery");
        let orders: Vec<Order> = api.get(self.stage.list_path(), &self.params()).await?;
        debug!(count = orders.len(), "Stage orders fetched");
        Ok(orders)
    }
}

/// Every order, for the supervisor table and client-side statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub date: Option<DateFilter>,
}

#[async_trait]
impl Query for ListOrdersQuery {
    type Result = Vec<Order>;

    #[instrument(skip(self, api))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing ListOrdersQuery");
        let params = self
            .date
            .as_ref()
            .map(DateFilter::query_pairs)
            .unwrap_or_default();
        api.get("orders/", &params).await
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
}

#[async_trait]
impl Query for GetOrderQuery {
    type Result = Order;

    #[instrument(skip(self, api), fields(order_id = self.order_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing GetOrderQuery");
        api.get(&format!("orders/{}/", self.order_id), &[]).await
    }
}

/// Exact-match lookup by reference on the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetOrderByReferenceQuery {
    pub reference: String,
}

impl GetOrderByReferenceQuery {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// Trimmed reference, or a validation error when nothing is left.
    pub fn normalized(&self) -> Result<&str, ClientError> {
        let reference = self.reference.trim();
        if reference.is_empty() {
            return Err(ClientError::Validation(EMPTY_REFERENCE_MESSAGE.to_string()));
        }
        Ok(reference)
    }
}

#[async_trait]
impl Query for GetOrderByReferenceQuery {
    type Result = Order;

    #[instrument(skip(self, api), fields(reference = %self.reference))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing GetOrderByReferenceQuery");
        let reference = self.normalized()?;
        let mut url = api.endpoint("orders/reference/")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Internal("API base URL cannot hold a path".into()))?
            .pop_if_empty()
            .push(reference)
            .push("");
        api.get(url.as_str(), &[]).await
    }
}
