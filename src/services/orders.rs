use crate::{
    client::ApiClient,
    commands::{
        orders::{CreateOrderCommand, DeleteOrdersCommand, TransitionOrderCommand, UpdateOrderCommand},
        Command,
    },
    errors::ClientError,
    models::{
        BulkDeleteResult, DateFilter, NewOrder, Order, OrderId, OrderUpdate, Stage,
        TransitionPayload,
    },
    queries::{
        order_queries::{GetOrderByReferenceQuery, GetOrderQuery, ListOrdersQuery, ListStageOrdersQuery},
        Query,
    },
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Order workflow operations
#[derive(Clone, Debug)]
pub struct OrderService {
    api: Arc<ApiClient>,
}

impl OrderService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Orders waiting for `stage`.
    #[instrument(skip(self), fields(stage = %stage))]
    pub async fn stage_orders(
        &self,
        stage: Stage,
        creator_only: bool,
        date: Option<DateFilter>,
    ) -> Result<Vec<Order>, ClientError> {
        ListStageOrdersQuery {
            stage,
            creator_only,
            date,
        }
        .execute(&self.api)
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self, date: Option<DateFilter>) -> Result<Vec<Order>, ClientError> {
        let orders = ListOrdersQuery { date }.execute(&self.api).await?;
        info!(count = orders.len(), "Orders listed successfully");
        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, ClientError> {
        GetOrderQuery { order_id }.execute(&self.api).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_reference(&self, reference: &str) -> Result<Order, ClientError> {
        GetOrderByReferenceQuery::new(reference)
            .execute(&self.api)
            .await
    }

    pub async fn create_order(&self, order: NewOrder) -> Result<Order, ClientError> {
        CreateOrderCommand { order }.execute(&self.api).await
    }

    pub async fn update_order(
        &self,
        order_id: OrderId,
        changes: OrderUpdate,
    ) -> Result<Order, ClientError> {
        UpdateOrderCommand { order_id, changes }
            .execute(&self.api)
            .await
    }

    /// Runs the stage transition and returns the backend's updated record.
    pub async fn advance(
        &self,
        stage: Stage,
        order_id: OrderId,
        payload: TransitionPayload,
    ) -> Result<Order, ClientError> {
        TransitionOrderCommand::new(stage, order_id)
            .with_payload(payload)
            .execute(&self.api)
            .await
    }

    pub async fn delete_orders(&self, order_ids: Vec<OrderId>) -> Result<BulkDeleteResult, ClientError> {
        DeleteOrdersCommand { order_ids }.execute(&self.api).await
    }
}
