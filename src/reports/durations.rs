//! Inter-stage durations derived from order timestamps.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::models::{Order, Timestamp};

pub const UNAVAILABLE_LABEL: &str = "Non disponible";

/// Whole minutes between two stage timestamps, or unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageDuration {
    Minutes(u64),
    Unavailable,
}

impl StageDuration {
    pub fn minutes(self) -> Option<u64> {
        match self {
            StageDuration::Minutes(m) => Some(m),
            StageDuration::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, StageDuration::Minutes(_))
    }
}

impl fmt::Display for StageDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageDuration::Minutes(m) => write!(f, "{m} minutes"),
            StageDuration::Unavailable => f.write_str(UNAVAILABLE_LABEL),
        }
    }
}

impl Serialize for StageDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StageDuration::Minutes(m) => serializer.serialize_u64(*m),
            StageDuration::Unavailable => serializer.serialize_none(),
        }
    }
}

/// `round(|end - start| / 60000)` in minutes.
///
/// Either side missing or unparseable yields [`StageDuration::Unavailable`].
pub fn duration_between(end: Option<&Timestamp>, start: Option<&Timestamp>) -> StageDuration {
    let (Some(end), Some(start)) = (end.and_then(Timestamp::parse), start.and_then(Timestamp::parse))
    else {
        return StageDuration::Unavailable;
    };

    let millis = (end - start).num_milliseconds().unsigned_abs();
    StageDuration::Minutes((millis + 30_000) / 60_000)
}

/// Per-order breakdown shown in the order details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OrderDurations {
    pub preparation: StageDuration,
    pub control: StageDuration,
    pub packing: StageDuration,
    pub total: StageDuration,
}

impl OrderDurations {
    pub fn of(order: &Order) -> Self {
        let finished = order.completed_at.as_ref().or(order.packed_at.as_ref());
        Self {
            preparation: duration_between(order.prepared_at.as_ref(), order.created_at.as_ref()),
            control: duration_between(order.controlled_at.as_ref(), order.prepared_at.as_ref()),
            packing: duration_between(order.packed_at.as_ref(), order.controlled_at.as_ref()),
            total: duration_between(finished, order.created_at.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ts(raw: &str) -> Timestamp {
        Timestamp::new(raw)
    }

    #[rstest]
    #[case("2024-01-01T10:17:00Z", "2024-01-01T10:00:00Z", 17)]
    #[case("2024-01-01T10:00:29Z", "2024-01-01T10:00:00Z", 0)]
    #[case("2024-01-01T10:00:30Z", "2024-01-01T10:00:00Z", 1)]
    #[case("2024-01-01T09:00:00Z", "2024-01-01T10:00:00Z", 60)]
    #[case("2024-01-01T11:00:00+01:00", "2024-01-01T10:00:00Z", 0)]
    fn rounds_absolute_minutes(#[case] end: &str, #[case] start: &str, #[case] expected: u64) {
        assert_eq!(
            duration_between(Some(&ts(end)), Some(&ts(start))),
            StageDuration::Minutes(expected)
        );
    }

    #[test]
    fn missing_prepared_at_is_unavailable() {
        let created = ts("2024-01-01T10:00:00Z");
        let duration = duration_between(None, Some(&created));
        assert_eq!(duration, StageDuration::Unavailable);
        assert_eq!(duration.to_string(), "Non disponible");
    }

    #[test]
    fn garbage_timestamp_is_unavailable() {
        let duration = duration_between(Some(&ts("n/a")), Some(&ts("2024-01-01T10:00:00Z")));
        assert!(!duration.is_available());
    }

    #[test]
    fn total_falls_back_to_packed_at() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 1,
            "reference": "R-1",
            "status": "PACKED",
            "created_at": "2024-01-01T10:00:00Z",
            "prepared_at": "2024-01-01T10:10:00Z",
            "controlled_at": "2024-01-01T10:15:00Z",
            "packed_at": "2024-01-01T10:45:00Z"
        }))
        .unwrap();

        let durations = OrderDurations::of(&order);
        assert_eq!(durations.preparation, StageDuration::Minutes(10));
        assert_eq!(durations.control, StageDuration::Minutes(5));
        assert_eq!(durations.packing, StageDuration::Minutes(30));
        assert_eq!(durations.total, StageDuration::Minutes(45));
        assert_eq!(durations.total.to_string(), "45 minutes");
    }
}
