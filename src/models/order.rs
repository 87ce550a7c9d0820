use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use super::user::User;

pub type OrderId = i64;

/// Lifecycle position of an order. Variants are declared in stage order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OrderStatus {
    Created,
    Prepared,
    Controlled,
    Packed,
    Completed,
}

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Created => "Créée",
            OrderStatus::Prepared => "Préparée",
            OrderStatus::Controlled => "Contrôlée",
            OrderStatus::Packed => "Emballée",
            OrderStatus::Completed => "Terminée",
        }
    }

    /// Whether the order still has workflow steps ahead of it.
    pub fn is_in_progress(self) -> bool {
        !matches!(self, OrderStatus::Packed | OrderStatus::Completed)
    }
}

/// A backend timestamp kept in its wire form.
///
/// Parsing is deferred so that one malformed value only affects the figures
/// derived from it, never the deserialization of the whole order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// RFC 3339 first, then the naive `YYYY-MM-DD HH:MM:SS[.f]` form read as UTC.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }

        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An order as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub reference: String,
    #[serde(default)]
    pub cart_number: String,
    #[serde(default)]
    pub line_count: Option<u32>,
    pub status: OrderStatus,

    #[serde(default)]
    pub creator: Option<i64>,
    #[serde(default)]
    pub creator_details: Option<User>,
    #[serde(default)]
    pub preparer: Option<i64>,
    #[serde(default)]
    pub preparer_details: Option<User>,
    #[serde(default)]
    pub controller: Option<i64>,
    #[serde(default)]
    pub controller_details: Option<User>,
    #[serde(default)]
    pub packer: Option<i64>,
    #[serde(default)]
    pub packer_details: Option<User>,

    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub prepared_at: Option<Timestamp>,
    #[serde(default)]
    pub controlled_at: Option<Timestamp>,
    #[serde(default)]
    pub packed_at: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

/// The user reference attached to an order for one workflow role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Participant {
    Creator,
    Preparer,
    Controller,
    Packer,
}

impl Order {
    /// User id linked to the given role, falling back to the embedded details.
    pub fn participant_id(&self, role: Participant) -> Option<i64> {
        let (id, details) = match role {
            Participant::Creator => (self.creator, &self.creator_details),
            Participant::Preparer => (self.preparer, &self.preparer_details),
            Participant::Controller => (self.controller, &self.controller_details),
            Participant::Packer => (self.packer, &self.packer_details),
        };
        id.or_else(|| details.as_ref().map(|user| user.id))
    }

    pub fn participant(&self, role: Participant) -> Option<&User> {
        match role {
            Participant::Creator => self.creator_details.as_ref(),
            Participant::Preparer => self.preparer_details.as_ref(),
            Participant::Controller => self.controller_details.as_ref(),
            Participant::Packer => self.packer_details.as_ref(),
        }
    }

    /// Timestamp recorded when the given role acted on the order.
    pub fn stamp_for(&self, role: Participant) -> Option<&Timestamp> {
        match role {
            Participant::Creator => self.created_at.as_ref(),
            Participant::Preparer => self.prepared_at.as_ref(),
            Participant::Controller => self.controlled_at.as_ref(),
            Participant::Packer => self.packed_at.as_ref(),
        }
    }

    /// Display name for a participant, `None` when nobody holds that role yet.
    pub fn participant_name(&self, role: Participant) -> Option<String> {
        self.participant(role).map(User::display_name)
    }

    /// Trimmed cart number, `None` when blank.
    pub fn cart(&self) -> Option<&str> {
        let cart = self.cart_number.trim();
        (!cart.is_empty()).then_some(cart)
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Ce champ est obligatoire".into());
        return Err(err);
    }
    Ok(())
}

/// Payload for `POST /orders/`.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewOrder {
    #[validate(
        length(max = 50, message = "La référence ne peut pas dépasser 50 caractères"),
        custom = "validate_not_blank"
    )]
    pub reference: String,
    #[validate(
        length(max = 50, message = "Le numéro de chariot ne peut pas dépasser 50 caractères"),
        custom = "validate_not_blank"
    )]
    pub cart_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Le nombre de lignes doit être un entier positif"))]
    pub line_count: Option<u32>,
}

impl NewOrder {
    pub fn new(reference: impl Into<String>, cart_number: impl Into<String>) -> Self {
        Self {
            reference: reference.into().trim().to_string(),
            cart_number: cart_number.into().trim().to_string(),
            line_count: None,
        }
    }

    pub fn with_line_count(mut self, line_count: u32) -> Self {
        self.line_count = Some(line_count);
        self
    }
}

/// Partial payload for `PUT /orders/{id}/`. The reference is read-only server side.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "Le numéro de chariot est invalide"))]
    pub cart_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Le nombre de lignes doit être un entier positif"))]
    pub line_count: Option<u32>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.cart_number.is_none() && self.status.is_none() && self.line_count.is_none()
    }
}

/// Body sent with a stage transition. Only preparation carries data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TransitionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Le nombre de lignes doit être un entier positif"))]
    pub line_count: Option<u32>,
}

impl TransitionPayload {
    pub fn with_line_count(line_count: u32) -> Self {
        Self {
            line_count: Some(line_count),
        }
    }
}

/// Response of `POST /orders/delete/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkDeleteResult {
    #[serde(default)]
    pub message: String,
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use validator::Validate;

    fn backend_order() -> serde_json::Value {
        json!({
            "id": 12,
            "reference": "CMD-0012",
            "status": "PREPARED",
            "cart_number": "C7",
            "line_count": 4,
            "creator": 3,
            "creator_details": {
                "id": 3, "username": "amartin", "email": "a@x.fr",
                "first_name": "Alice", "last_name": "Martin", "role": "AGENT"
            },
            "preparer": 5,
            "preparer_details": {
                "id": 5, "username": "bdupont", "email": "b@x.fr",
                "first_name": "", "last_name": "", "role": "SUPER_AGENT"
            },
            "controller": null,
            "controller_details": null,
            "packer": null,
            "packer_details": null,
            "created_at": "2024-01-01T10:00:00Z",
            "prepared_at": "2024-01-01T10:17:31.123456+01:00",
            "controlled_at": null,
            "packed_at": null,
            "completed_at": null,
            "preparation_time": 17.5,
            "control_time": null,
            "packing_time": null,
            "total_time": null
        })
    }

    #[test]
    fn decodes_backend_record() {
        let order: Order = serde_json::from_value(backend_order()).unwrap();
        assert_eq!(order.status, OrderStatus::Prepared);
        assert_eq!(order.line_count, Some(4));
        assert_eq!(order.participant_id(Participant::Preparer), Some(5));
        assert_eq!(
            order.participant_name(Participant::Creator).as_deref(),
            Some("Alice Martin")
        );
        assert_eq!(
            order.participant_name(Participant::Preparer).as_deref(),
            Some("bdupont")
        );
        assert!(order.participant(Participant::Controller).is_none());
        assert!(order.prepared_at.as_ref().and_then(Timestamp::parse).is_some());
        assert_eq!(
            order.stamp_for(Participant::Creator).map(Timestamp::as_str),
            Some("2024-01-01T10:00:00Z")
        );
        assert!(order.stamp_for(Participant::Controller).is_none());
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        assert_eq!(OrderStatus::from_str("controlled").unwrap(), OrderStatus::Controlled);
        assert_eq!(OrderStatus::Packed.to_string(), "PACKED");
        assert!(OrderStatus::Created < OrderStatus::Completed);
        assert!(!OrderStatus::Packed.is_in_progress());
    }

    #[test]
    fn malformed_timestamp_does_not_break_decoding() {
        let mut raw = backend_order();
        raw["created_at"] = json!("yesterday-ish");
        let order: Order = serde_json::from_value(raw).unwrap();
        assert!(order.created_at.as_ref().unwrap().parse().is_none());
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let stamp = Timestamp::new("2024-03-05 08:15:00");
        let parsed = stamp.parse().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T08:15:00+00:00");
    }

    #[test]
    fn new_order_requires_reference_and_cart() {
        assert!(NewOrder::new("  ", "C1").validate().is_err());
        assert!(NewOrder::new("REF-1", "").validate().is_err());
        assert!(NewOrder::new("REF-1", "C1").validate().is_ok());
        assert!(NewOrder::new("REF-1", "C1")
            .with_line_count(0)
            .validate()
            .is_err());
    }

    #[test]
    fn transition_payload_omits_absent_line_count() {
        let body = serde_json::to_value(TransitionPayload::default()).unwrap();
        assert_eq!(body, json!({}));
        assert!(TransitionPayload::with_line_count(0).validate().is_err());
    }
}
