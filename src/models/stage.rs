use serde::{Deserialize, Serialize};

use super::order::{OrderId, OrderStatus};

/// One actionable step of the workflow.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Stage {
    Preparation,
    Control,
    Packing,
}

/// Presentation and routing data for a stage.
///
/// Every stage screen is the same component driven by one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StageConfig {
    pub stage: Stage,
    pub label: &'static str,
    pub color: &'static str,
    /// Path segment of the transition endpoint: `/orders/{id}/{endpoint}/`.
    pub endpoint: &'static str,
    /// Status an order must have to appear on this stage's list.
    pub pending_status: OrderStatus,
    /// Status the backend reports after a successful transition.
    pub done_status: OrderStatus,
    /// Whether the validation form may carry a line count.
    pub accepts_line_count: bool,
}

const PREPARATION: StageConfig = StageConfig {
    stage: Stage::Preparation,
    label: "Préparation",
    color: "#1976d2",
    endpoint: "prepare",
    pending_status: OrderStatus::Created,
    done_status: OrderStatus::Prepared,
    accepts_line_count: true,
};

const CONTROL: StageConfig = StageConfig {
    stage: Stage::Control,
    label: "Contrôle",
    color: "#ed6c02",
    endpoint: "control",
    pending_status: OrderStatus::Prepared,
    done_status: OrderStatus::Controlled,
    accepts_line_count: false,
};

const PACKING: StageConfig = StageConfig {
    stage: Stage::Packing,
    label: "Emballage",
    color: "#2e7d32",
    endpoint: "pack",
    pending_status: OrderStatus::Controlled,
    done_status: OrderStatus::Packed,
    accepts_line_count: false,
};

impl Stage {
    pub fn config(self) -> &'static StageConfig {
        match self {
            Stage::Preparation => &PREPARATION,
            Stage::Control => &CONTROL,
            Stage::Packing => &PACKING,
        }
    }

    /// `GET` path listing the orders waiting for this stage.
    pub fn list_path(self) -> &'static str {
        match self {
            Stage::Preparation => "orders/preparation/",
            Stage::Control => "orders/control/",
            Stage::Packing => "orders/packing/",
        }
    }

    pub fn transition_path(self, order_id: OrderId) -> String {
        format!("orders/{order_id}/{}/", self.config().endpoint)
    }

    /// Stage whose list an order with the given status belongs to.
    pub fn awaiting(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Created => Some(Stage::Preparation),
            OrderStatus::Prepared => Some(Stage::Control),
            OrderStatus::Controlled => Some(Stage::Packing),
            OrderStatus::Packed | OrderStatus::Completed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn stages_chain_statuses_in_order() {
        let stages: Vec<_> = Stage::iter().collect();
        for pair in stages.windows(2) {
            assert_eq!(pair[0].config().done_status, pair[1].config().pending_status);
        }
    }

    #[test]
    fn transition_paths_use_stage_endpoint() {
        assert_eq!(Stage::Preparation.transition_path(7), "orders/7/prepare/");
        assert_eq!(Stage::Control.transition_path(7), "orders/7/control/");
        assert_eq!(Stage::Packing.transition_path(7), "orders/7/pack/");
    }

    #[test]
    fn awaiting_maps_status_to_its_queue() {
        for stage in Stage::iter() {
            assert_eq!(Stage::awaiting(stage.config().pending_status), Some(stage));
        }
        assert_eq!(Stage::awaiting(OrderStatus::Packed), None);
    }
}
