use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::order::{OrderId, OrderStatus, Participant, Timestamp};
use super::user::{Role, UserId};

pub const UNKNOWN_STATUS_LABEL: &str = "Inconnu";
pub const NOT_HANDLED_LABEL: &str = "Non traitée";
pub const UNTRACKED_ORDER_MESSAGE: &str =
    "Cette commande PrestaShop n'a pas encore été traitée dans le système interne.";
pub const EMPTY_FEED_MESSAGE: &str = "Aucune commande PrestaShop n'a été trouvée pour aujourd'hui.";

/// The shop sends ids, amounts and status codes either as strings or numbers.
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

/// "12.5" → "12.50 €"; anything unparseable is shown as received.
fn euros(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(amount) => format!("{amount:.2} €"),
        Err(_) => raw.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestaProduct {
    #[serde(default, deserialize_with = "loose_text")]
    pub product_name: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub quantity: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub price: String,
}

impl PrestaProduct {
    pub fn price_display(&self) -> String {
        euros(&self.price)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandlerUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
}

impl HandlerUser {
    pub fn display_name(&self) -> &str {
        let full = self.full_name.trim();
        if full.is_empty() {
            self.username.as_str()
        } else {
            full
        }
    }
}

/// Who acted on the internal order for one role, and when.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerRecord {
    #[serde(default)]
    pub user: Option<HandlerUser>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Empty (`{}`) when the shop order has no internal counterpart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestaHandlers {
    pub creator: Option<HandlerRecord>,
    pub preparer: Option<HandlerRecord>,
    pub controller: Option<HandlerRecord>,
    pub packer: Option<HandlerRecord>,
}

impl PrestaHandlers {
    pub fn get(&self, role: Participant) -> Option<&HandlerRecord> {
        match role {
            Participant::Creator => self.creator.as_ref(),
            Participant::Preparer => self.preparer.as_ref(),
            Participant::Controller => self.controller.as_ref(),
            Participant::Packer => self.packer.as_ref(),
        }
    }
}

/// One of today's shop orders, from `GET /orders/presta-orders/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestaOrder {
    #[serde(deserialize_with = "loose_text")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub reference: String,
    #[serde(default)]
    pub date: Option<Timestamp>,
    #[serde(default, deserialize_with = "loose_text")]
    pub status: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub total_paid: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub payment_method: String,
    #[serde(default)]
    pub products: Vec<PrestaProduct>,
    #[serde(default)]
    pub internal_order_id: Option<OrderId>,
    #[serde(default)]
    pub internal_order_status: Option<OrderStatus>,
    #[serde(default)]
    pub handlers: PrestaHandlers,
}

impl PrestaOrder {
    /// Label for the shop status code; internal orders report codes 2, 4, 5 and 6.
    pub fn status_label(&self) -> &'static str {
        match self.status.trim() {
            "1" => "En attente",
            "2" => "Commandée",
            "3" => "En préparation",
            "4" => "Préparée",
            "5" => "Contrôlée",
            "6" => "Emballée",
            "7" => "Annulée",
            "8" => "Remboursée",
            "9" => "Erreur de paiement",
            _ => UNKNOWN_STATUS_LABEL,
        }
    }

    pub fn status_color(&self) -> &'static str {
        match self.status.trim() {
            "1" => "#3498db",
            "2" => "#2ecc71",
            "3" => "#f39c12",
            "4" => "#9b59b6",
            "5" => "#e74c3c",
            "6" => "#27ae60",
            "7" => "#95a5a6",
            "8" => "#34495e",
            "9" => "#7f8c8d",
            _ => "#cccccc",
        }
    }

    /// Whether the warehouse workflow knows this order.
    pub fn is_tracked(&self) -> bool {
        self.internal_order_id.is_some()
    }

    pub fn handler(&self, role: Participant) -> Option<&HandlerRecord> {
        self.handlers.get(role)
    }

    pub fn total_display(&self) -> String {
        euros(&self.total_paid)
    }
}
