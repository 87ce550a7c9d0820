use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{Order, OrderId, OrderUpdate},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderCommand {
    pub order_id: OrderId,
    pub changes: OrderUpdate,
}

#[async_trait::async_trait]
impl Command for UpdateOrderCommand {
    type Result = Order;

    #[instrument(skip(self, api), fields(order_id = self.order_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        if self.changes.is_empty() {
            return Err(ClientError::Validation(
                "Aucune modification à enregistrer".to_string(),
            ));
        }
        self.changes.validate().map_err(|e| {
            error!("Invalid order update: {}", e);
            ClientError::from(e)
        })?;

        let updated: Order = api
            .put(&format!("orders/{}/", self.order_id), &self.changes)
            .await?;
        info!(status = %updated.status, "Order updated");
        Ok(updated)
    }
}
