//! Figures derived from raw order timestamps.

pub mod durations;
pub mod order_stats;

pub use durations::{duration_between, OrderDurations, StageDuration, UNAVAILABLE_LABEL};
pub use order_stats::{
    agent_performance, average_durations, daily_counts, dashboard_counts, recent_orders,
    scoreboard, status_counts, AgentPerformance, AverageDurations, DailyCount, RecentOrder,
    ScoreEntry, StatusCounts, RECENT_ORDERS_LIMIT,
};
