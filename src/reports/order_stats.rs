//! Client-side aggregation over a flat order list.
//!
//! Every function is a single pass over in-memory data. A bad timestamp only
//! removes that order from the figure it feeds; nothing here fails.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::durations::{OrderDurations, StageDuration};
use crate::models::{
    Order, OrderCounts, OrderId, OrderStatus, Participant, Role, Timestamp, User, UserId,
};

pub const RECENT_ORDERS_LIMIT: usize = 7;
const FALLBACK_AGENT_NAME: &str = "Agent";

/// Orders per status bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub created: usize,
    pub prepared: usize,
    pub controlled: usize,
    pub packed: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Created => self.created,
            OrderStatus::Prepared => self.prepared,
            OrderStatus::Controlled => self.controlled,
            OrderStatus::Packed => self.packed,
            OrderStatus::Completed => self.completed,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.prepared + self.controlled + self.packed + self.completed
    }

    fn record(&mut self, status: OrderStatus) {
        let slot = match status {
            OrderStatus::Created => &mut self.created,
            OrderStatus::Prepared => &mut self.prepared,
            OrderStatus::Controlled => &mut self.controlled,
            OrderStatus::Packed => &mut self.packed,
            OrderStatus::Completed => &mut self.completed,
        };
        *slot += 1;
    }
}

pub fn status_counts(orders: &[Order]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for order in orders {
        counts.record(order.status);
    }
    counts
}

/// Total / in progress / completed, the same split the backend dashboard uses.
pub fn dashboard_counts(orders: &[Order]) -> OrderCounts {
    let in_progress = orders.iter().filter(|o| o.status.is_in_progress()).count() as u64;
    let total = orders.len() as u64;
    OrderCounts {
        total,
        in_progress,
        completed: total - in_progress,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentPerformance {
    pub user_id: UserId,
    pub name: String,
    pub created: usize,
    pub prepared: usize,
    pub controlled: usize,
    pub packed: usize,
}

impl AgentPerformance {
    fn empty(user_id: UserId, name: String) -> Self {
        Self {
            user_id,
            name,
            created: 0,
            prepared: 0,
            controlled: 0,
            packed: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.prepared + self.controlled + self.packed
    }

    fn slot(&mut self, role: Participant) -> &mut usize {
        match role {
            Participant::Creator => &mut self.created,
            Participant::Preparer => &mut self.prepared,
            Participant::Controller => &mut self.controlled,
            Participant::Packer => &mut self.packed,
        }
    }
}

const ALL_PARTICIPANTS: [Participant; 4] = [
    Participant::Creator,
    Participant::Preparer,
    Participant::Controller,
    Participant::Packer,
];

/// Per-agent created/prepared/controlled/packed counts, busiest first.
///
/// With an agent list, every agent gets a row (possibly all zeros) and
/// orders handled by anyone else are ignored. Without one, a row is made for
/// every user id referenced by the orders.
pub fn agent_performance(orders: &[Order], agents: Option<&[User]>) -> Vec<AgentPerformance> {
    let mut rows: Vec<AgentPerformance> = Vec::new();
    let mut index: HashMap<UserId, usize> = HashMap::new();

    if let Some(agents) = agents {
        for agent in agents {
            index.entry(agent.id).or_insert_with(|| {
                rows.push(AgentPerformance::empty(agent.id, agent.display_name()));
                rows.len() - 1
            });
        }
    }
    let open_roster = agents.is_none();

    for order in orders {
        for role in ALL_PARTICIPANTS {
            let Some(user_id) = order.participant_id(role) else {
                continue;
            };
            let position = match index.get(&user_id) {
                Some(position) => *position,
                None if open_roster => {
                    let name = order
                        .participant_name(role)
                        .unwrap_or_else(|| format!("{FALLBACK_AGENT_NAME} #{user_id}"));
                    rows.push(AgentPerformance::empty(user_id, name));
                    index.insert(user_id, rows.len() - 1);
                    rows.len() - 1
                }
                None => continue,
            };
            *rows[position].slot(role) += 1;
        }
    }

    rows.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Mean minutes per stage over the orders where the figure is available.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AverageDurations {
    pub preparation: Option<f64>,
    pub control: Option<f64>,
    pub packing: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Default)]
struct Mean {
    sum: u64,
    count: u64,
}

impl Mean {
    fn push(&mut self, duration: StageDuration) {
        if let Some(minutes) = duration.minutes() {
            self.sum += minutes;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

pub fn average_durations(orders: &[Order]) -> AverageDurations {
    let (mut preparation, mut control, mut packing, mut total) =
        (Mean::default(), Mean::default(), Mean::default(), Mean::default());

    for order in orders {
        let durations = OrderDurations::of(order);
        preparation.push(durations.preparation);
        control.push(durations.control);
        packing.push(durations.packing);
        total.push(durations.total);
    }

    AverageDurations {
        preparation: preparation.value(),
        control: control.value(),
        packing: packing.value(),
        total: total.value(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub total: usize,
    pub by_status: StatusCounts,
}

/// One entry per day of `[start, end]` (inclusive), bucketed by `created_at` in UTC.
///
/// Orders created outside the window or with an unreadable `created_at` are skipped.
pub fn daily_counts(orders: &[Order], start: NaiveDate, end: NaiveDate) -> Vec<DailyCount> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let mut buckets: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();

    let mut day = start;
    while day <= end {
        buckets.insert(day, StatusCounts::default());
        day += Duration::days(1);
    }

    for order in orders {
        let Some(created) = order.created_at.as_ref().and_then(Timestamp::parse) else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(&created.date_naive()) {
            bucket.record(order.status);
        }
    }

    buckets
        .into_iter()
        .map(|(day, by_status)| DailyCount {
            day,
            total: by_status.total(),
            by_status,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecentOrder {
    pub id: OrderId,
    pub reference: String,
    pub status: OrderStatus,
    pub created_at: Option<Timestamp>,
    pub agent: String,
}

/// The `limit` most recently created orders, newest first.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<RecentOrder> {
    let mut dated: Vec<(&Order, Option<chrono::DateTime<chrono::Utc>>)> = orders
        .iter()
        .map(|order| (order, order.created_at.as_ref().and_then(Timestamp::parse)))
        .collect();
    // `None` sorts first under Ord, so the reversed comparison puts undated orders last.
    dated.sort_by(|a, b| b.1.cmp(&a.1));

    dated
        .into_iter()
        .take(limit)
        .map(|(order, _)| RecentOrder {
            id: order.id,
            reference: order.reference.clone(),
            status: order.status,
            created_at: order.created_at.clone(),
            agent: creator_label(order),
        })
        .collect()
}

fn creator_label(order: &Order) -> String {
    order
        .participant(Participant::Creator)
        .map(|user| {
            let full = format!("{} {}", user.first_name.trim(), user.last_name.trim());
            let full = full.trim();
            if !full.is_empty() {
                full.to_string()
            } else if !user.username.trim().is_empty() {
                user.username.clone()
            } else {
                FALLBACK_AGENT_NAME.to_string()
            }
        })
        .unwrap_or_else(|| FALLBACK_AGENT_NAME.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    pub prepared: usize,
    pub controlled: usize,
    pub packed: usize,
    pub total: usize,
}

/// Roles that appear on the scoreboard.
fn is_ranked(user: &User) -> bool {
    matches!(user.role, Role::Agent | Role::Manager)
}

/// Daily ranking: a stage only counts once its timestamp is recorded.
///
/// Only agents and managers are ranked, and users with nothing to their
/// name are left out.
pub fn scoreboard(orders: &[Order], users: &[User]) -> Vec<ScoreEntry> {
    let roster: Vec<&User> = users.iter().filter(|user| is_ranked(user)).collect();
    let mut tallies: HashMap<UserId, [usize; 3]> =
        roster.iter().map(|user| (user.id, [0; 3])).collect();

    for order in orders {
        let stages = [
            (order.preparer, order.prepared_at.is_some()),
            (order.controller, order.controlled_at.is_some()),
            (order.packer, order.packed_at.is_some()),
        ];
        for (slot, (user_id, stamped)) in stages.into_iter().enumerate() {
            if let (Some(user_id), true) = (user_id, stamped) {
                if let Some(tally) = tallies.get_mut(&user_id) {
                    tally[slot] += 1;
                }
            }
        }
    }

    let mut entries: Vec<ScoreEntry> = roster
        .into_iter()
        .filter_map(|user| {
            let [prepared, controlled, packed] = *tallies.get(&user.id)?;
            let total = prepared + controlled + packed;
            (total > 0).then(|| ScoreEntry {
                rank: 0,
                user_id: user.id,
                name: user.display_name(),
                prepared,
                controlled,
                packed,
                total,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.total.cmp(&a.total));
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position + 1;
    }
    entries
}
