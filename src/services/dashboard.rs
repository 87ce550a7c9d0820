use crate::{
    client::ApiClient,
    errors::ClientError,
    models::{DashboardStats, DateFilter, Order, OrderCounts, Role, User},
    queries::{
        dashboard_queries::DashboardQuery, order_queries::ListOrdersQuery,
        user_queries::ListUsersQuery, Query,
    },
    reports::{
        agent_performance, average_durations, daily_counts, dashboard_counts, recent_orders,
        scoreboard, status_counts, AgentPerformance, AverageDurations, DailyCount, RecentOrder,
        ScoreEntry, StatusCounts, RECENT_ORDERS_LIMIT,
    },
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything the statistics page derives client side from one order list.
#[derive(Clone, Debug, Serialize)]
pub struct OrderStatistics {
    pub window: (NaiveDate, NaiveDate),
    pub counts: OrderCounts,
    pub by_status: StatusCounts,
    pub averages: AverageDurations,
    pub agents: Vec<AgentPerformance>,
    pub daily: Vec<DailyCount>,
    pub recent: Vec<RecentOrder>,
}

impl OrderStatistics {
    pub fn compute(orders: &[Order], agents: Option<&[User]>, window: (NaiveDate, NaiveDate)) -> Self {
        Self {
            window,
            counts: dashboard_counts(orders),
            by_status: status_counts(orders),
            averages: average_durations(orders),
            agents: agent_performance(orders, agents),
            daily: daily_counts(orders, window.0, window.1),
            recent: recent_orders(orders, RECENT_ORDERS_LIMIT),
        }
    }
}

/// Read-only statistics for managers
#[derive(Clone, Debug)]
pub struct DashboardService {
    api: Arc<ApiClient>,
}

impl DashboardService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Server-side aggregate from `GET /orders/dashboard/`.
    #[instrument(skip(self))]
    pub async fn dashboard(&self, date: DateFilter) -> Result<DashboardStats, ClientError> {
        DashboardQuery { date }.execute(&self.api).await
    }

    /// Fetches orders and agents together, then aggregates locally.
    #[instrument(skip(self))]
    pub async fn statistics(&self, date: DateFilter) -> Result<OrderStatistics, ClientError> {
        let orders_query = ListOrdersQuery { date: Some(date) };
        let agents_query = ListUsersQuery {
            role: Some(Role::Agent),
        };
        let (orders, agents) = futures::try_join!(
            orders_query.execute(&self.api),
            agents_query.execute(&self.api)
        )?;

        let window = date.window(Utc::now().date_naive());
        let stats = OrderStatistics::compute(&orders, Some(agents.as_slice()), window);
        info!(orders = orders.len(), agents = agents.len(), "Statistics computed");
        Ok(stats)
    }

    /// Today's ranking of agents and managers.
    ///
    /// Pages that keep it on screen re-run it through `views::watch`.
    #[instrument(skip(self))]
    pub async fn scoreboard(&self) -> Result<Vec<ScoreEntry>, ClientError> {
        let orders_query = ListOrdersQuery {
            date: Some(DateFilter::Today),
        };
        let users_query = ListUsersQuery::default();
        let (orders, users) = futures::try_join!(
            orders_query.execute(&self.api),
            users_query.execute(&self.api)
        )?;
        Ok(scoreboard(&orders, &users))
    }
}
