use crate::{
    client::ApiClient,
    commands::Command,
    errors::ClientError,
    models::{Order, OrderId, Stage, TransitionPayload},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

/// Advances one order through a stage: `POST /orders/{id}/{prepare|control|pack}/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionOrderCommand {
    pub stage: Stage,
    pub order_id: OrderId,
    #[serde(default)]
    pub payload: TransitionPayload,
}

impl TransitionOrderCommand {
    pub fn new(stage: Stage, order_id: OrderId) -> Self {
        Self {
            stage,
            order_id,
            payload: TransitionPayload::default(),
        }
    }

    pub fn with_payload(mut self, payload: TransitionPayload) -> Self {
        self.payload = payload;
        self
    }

    fn check_payload(&self) -> Result<(), ClientError> {
        if self.payload.line_count.is_some() && !self.stage.config().accepts_line_count {
            return Err(ClientError::Validation(format!(
                "L'étape {} n'accepte pas de nombre de lignes",
                self.stage.config().label
            )));
        }
        self.payload.validate().map_err(ClientError::from)
    }
}

#[async_trait::async_trait]
impl Command for TransitionOrderCommand {
    type Result = Order;

    #[instrument(skip(self, api), fields(stage = %self.stage, order_id = self.order_id))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        self.check_payload().map_err(|e| {
            error!("Invalid transition payload: {}", e);
            e
        })?;

        let path = self.stage.transition_path(self.order_id);
        let order: Order = api.post(&path, &self.payload).await?;
        info!(status = %order.status, "Order advanced");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_count_only_allowed_on_preparation() {
        let prepare = TransitionOrderCommand::new(Stage::Preparation, 1)
            .with_payload(TransitionPayload::with_line_count(3));
        assert!(prepare.check_payload().is_ok());

        let pack = TransitionOrderCommand::new(Stage::Packing, 1)
            .with_payload(TransitionPayload::with_line_count(3));
        assert!(matches!(pack.check_payload(), Err(ClientError::Validation(_))));
    }

    #[test]
    fn zero_line_count_is_rejected() {
        let prepare = TransitionOrderCommand::new(Stage::Preparation, 1)
            .with_payload(TransitionPayload::with_line_count(0));
        assert!(matches!(prepare.check_payload(), Err(ClientError::Validation(_))));
    }
}
