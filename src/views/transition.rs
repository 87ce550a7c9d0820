//! Single-order stage transition with callback-driven reload.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::ClientError;
use crate::models::{Order, OrderId, Stage, TransitionPayload};
use crate::services::OrderService;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The backend's updated record.
    Completed(Order),
    /// Nothing changed locally; `message` goes to the alert region.
    Failed {
        message: String,
        session_expired: bool,
    },
}

impl TransitionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TransitionOutcome::Completed(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            TransitionOutcome::Failed { message, .. } => Some(message),
            TransitionOutcome::Completed(_) => None,
        }
    }
}

/// The validate button of one stage.
#[derive(Clone, Debug)]
pub struct TransitionAction {
    stage: Stage,
    orders: Arc<OrderService>,
}

impl TransitionAction {
    pub fn new(stage: Stage, orders: Arc<OrderService>) -> Self {
        Self { stage, orders }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Calls the stage endpoint once. `on_success` runs only after the
    /// backend accepted the transition; there is no retry and no optimistic
    /// update.
    #[instrument(skip(self, payload, on_success), fields(stage = %self.stage))]
    pub async fn execute<F, Fut>(
        &self,
        order_id: OrderId,
        payload: TransitionPayload,
        on_success: F,
    ) -> TransitionOutcome
    where
        F: FnOnce(Order) -> Fut,
        Fut: Future<Output = ()>,
    {
        match self.orders.advance(self.stage, order_id, payload).await {
            Ok(order) => {
                info!(status = %order.status, "Transition accepted");
                on_success(order.clone()).await;
                TransitionOutcome::Completed(order)
            }
            Err(err) => {
                warn!(error = %err, "Transition failed");
                TransitionOutcome::Failed {
                    message: err.user_message(),
                    session_expired: matches!(err, ClientError::SessionExpired),
                }
            }
        }
    }
}
