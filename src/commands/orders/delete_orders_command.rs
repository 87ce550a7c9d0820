use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{BulkDeleteResult, OrderId},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Bulk removal through `POST /orders/delete/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteOrdersCommand {
    pub order_ids: Vec<OrderId>,
}

#[async_trait::async_trait]
impl Command for DeleteOrdersCommand {
    type Result = BulkDeleteResult;

    #[instrument(skip(self, api), fields(count = self.order_ids.len()))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        if self.order_ids.is_empty() {
            return Err(ClientError::Validation(
                "Aucune commande sélectionnée".to_string(),
            ));
        }

        let result: BulkDeleteResult = api.post("orders/delete/", self).await?;
        info!(deleted = result.deleted_count, "Orders deleted");
        Ok(result)
    }
}
