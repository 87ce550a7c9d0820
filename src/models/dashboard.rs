use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Date scope applied to list and dashboard requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilter {
    #[default]
    Today,
    Day(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateFilter {
    /// Query parameters understood by the backend.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            DateFilter::Today => vec![("date", "today".to_string())],
            DateFilter::Day(day) => vec![("date", day.format("%Y-%m-%d").to_string())],
            DateFilter::Range { start, end } => vec![
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
            ],
        }
    }

    /// Inclusive day window, resolved against `today`.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            DateFilter::Today => (today, today),
            DateFilter::Day(day) => (day, day),
            DateFilter::Range { start, end } if start <= end => (start, end),
            DateFilter::Range { start, end } => (end, start),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderCounts {
    pub total: u64,
    pub in_progress: u64,
    pub completed: u64,
}

/// Average minutes per stage as computed by the backend (0 when no data).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageTimes {
    pub preparation: f64,
    pub control: f64,
    pub packing: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentStat {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub created_count: u64,
    pub prepared_count: u64,
    pub controlled_count: u64,
    pub packed_count: u64,
    #[serde(default)]
    pub total_count: u64,
}

impl AgentStat {
    pub fn display_name(&self) -> String {
        if !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty() {
            format!("{} {}", self.first_name.trim(), self.last_name.trim())
        } else {
            self.username.clone()
        }
    }

    pub fn processed(&self) -> u64 {
        self.created_count + self.prepared_count + self.controlled_count + self.packed_count
    }
}

/// Response of `GET /orders/dashboard/`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub order_counts: OrderCounts,
    pub average_times: AverageTimes,
    #[serde(default)]
    pub agent_stats: Vec<AgentStat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_follow_filter_kind() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            DateFilter::Today.query_pairs(),
            vec![("date", "today".to_string())]
        );
        assert_eq!(
            DateFilter::Day(day).query_pairs(),
            vec![("date", "2024-02-29".to_string())]
        );
        let next = day.succ_opt().unwrap();
        assert_eq!(
            DateFilter::Range { start: day, end: next }.query_pairs(),
            vec![
                ("start_date", "2024-02-29".to_string()),
                ("end_date", "2024-03-01".to_string())
            ]
        );
    }

    #[test]
    fn reversed_range_window_is_normalized() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(DateFilter::Range { start: a, end: b }.window(a), (b, a));
    }

    #[test]
    fn decodes_dashboard_payload() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "order_counts": {"total": 12, "in_progress": 9, "completed": 3},
            "average_times": {"preparation": 14.5, "control": 6.0, "packing": 3.25, "total": 30.0},
            "agent_stats": [{
                "id": 4, "username": "lbernard", "first_name": "Louise", "last_name": "Bernard",
                "created_count": 2, "prepared_count": 5, "controlled_count": 1,
                "packed_count": 0, "total_count": 8
            }]
        }))
        .unwrap();

        assert_eq!(stats.order_counts.in_progress, 9);
        assert_eq!(stats.agent_stats[0].display_name(), "Louise Bernard");
        assert_eq!(stats.agent_stats[0].processed(), 8);
    }
}
