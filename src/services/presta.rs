use crate::{
    client::ApiClient,
    errors::ClientError,
    models::PrestaOrder,
    queries::{presta_queries::PrestaOrdersQuery, Query},
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Read-only view of the web shop's orders of the day, manager only
#[derive(Clone, Debug)]
pub struct PrestaService {
    api: Arc<ApiClient>,
}

impl PrestaService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Shop orders created today, with their handlers when tracked internally.
    #[instrument(skip(self))]
    pub async fn todays_orders(&self) -> Result<Vec<PrestaOrder>, ClientError> {
        let orders = PrestaOrdersQuery.execute(&self.api).await?;
        let tracked = orders.iter().filter(|order| order.is_tracked()).count();
        info!(count = orders.len(), tracked, "Shop orders fetched");
        Ok(orders)
    }
}
