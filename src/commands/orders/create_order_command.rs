use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{NewOrder, Order},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    pub order: NewOrder,
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = Order;

    #[instrument(skip(self, api), fields(reference = %self.order.reference))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        self.order.validate().map_err(|e| {
            error!("Invalid order input: {}", e);
            ClientError::from(e)
        })?;

        let created: Order = api.post("orders/", &self.order).await?;
        info!(order_id = created.id, status = %created.status, "Order created");
        Ok(created)
    }
}
