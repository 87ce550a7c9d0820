use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Query;
use crate::{client::ApiClient, errors::ClientError, models::PrestaOrder};

/// Today's shop orders, joined server side with their internal counterparts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrestaOrdersQuery;

#[async_trait]
impl Query for PrestaOrdersQuery {
    type Result = Vec<PrestaOrder>;

    #[instrument(skip(self, api))]
    async fn execute(&self, api: &ApiClient) -> Result<Self::Result, ClientError> {
        debug!("Executing PrestaOrdersQuery");
        api.get("orders/presta-orders/", &[]).await
    }
}
