use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Query;
use crate::{
    client::ApiClient,
    errors::ClientError,
    models::{DashboardStats, DateFilter},
};

/// Server-side aggregate behind the manager dashboard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub date: DateFilter,
}

#[async_trait]
impl Query for DashboardQuery {
    type Result = DashboardStats;

    #[instrument(skip(self, api), fields(date = ?self.date))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing DashboardQuery");
        api.get("orders/dashboard/", &self.date.query_pairs()).await
    }
}
