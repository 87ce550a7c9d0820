//! State of one stage page: load, filter, paginate, act, reload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::fetch_gate::FetchGate;
use super::reference_filter;
use super::table::{stage_columns, TableView};
use super::transition::{TransitionAction, TransitionOutcome};
use crate::config::AppConfig;
use crate::errors::ClientError;
use crate::models::{DateFilter, Order, OrderId, Stage, StageConfig, TransitionPayload};
use crate::services::OrderService;

/// Read-only copy of a board for rendering.
#[derive(Clone, Debug, Serialize)]
pub struct BoardSnapshot {
    pub stage: Stage,
    pub label: &'static str,
    pub color: &'static str,
    pub query: String,
    pub loaded: usize,
    pub matching: usize,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub rows: Vec<Order>,
    pub selected: Vec<OrderId>,
    pub notice: Option<String>,
    pub alert: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct BoardState {
    orders: Vec<Order>,
    query: String,
    notice: Option<String>,
    table: TableView<Order>,
    alert: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl BoardState {
    /// Re-runs the reference filter and feeds the table.
    fn apply_filter(&mut self) {
        let outcome = reference_filter::apply(&self.orders, &self.query);
        self.notice = outcome.notice;
        let rows: Vec<Order> = outcome.matches.into_iter().cloned().collect();
        self.table.set_rows(rows);
    }
}

/// One parametrized board shared by preparation, control and packing.
#[derive(Debug)]
pub struct StageBoard {
    stage: Stage,
    creator_only: bool,
    date: Option<DateFilter>,
    orders: Arc<OrderService>,
    action: TransitionAction,
    gate: FetchGate,
    state: Mutex<BoardState>,
}

impl StageBoard {
    pub fn new(stage: Stage, orders: Arc<OrderService>, table: TableView<Order>) -> Self {
        Self {
            stage,
            creator_only: false,
            date: None,
            action: TransitionAction::new(stage, orders.clone()),
            orders,
            gate: FetchGate::new(),
            state: Mutex::new(BoardState {
                orders: Vec::new(),
                query: String::new(),
                notice: None,
                table,
                alert: None,
                last_updated: None,
            }),
        }
    }

    pub fn from_config(
        stage: Stage,
        orders: Arc<OrderService>,
        config: &AppConfig,
    ) -> Result<Self, ClientError> {
        let table = TableView::from_config(stage_columns(), config)?;
        Ok(Self::new(stage, orders, table))
    }

    pub fn with_creator_only(mut self, creator_only: bool) -> Self {
        self.creator_only = creator_only;
        self
    }

    pub fn with_date(mut self, date: Option<DateFilter>) -> Self {
        self.date = date;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &'static StageConfig {
        self.stage.config()
    }

    /// Re-fetches the stage list. Only the newest reload may write state.
    ///
    /// A failed reload keeps the previous rows and raises the alert.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub async fn reload(&self) -> Result<usize, ClientError> {
        let orders = self.orders.clone();
        let (stage, creator_only, date) = (self.stage, self.creator_only, self.date);
        let fetched = self
            .gate
            .run(async move { orders.stage_orders(stage, creator_only, date).await })
            .await;

        match fetched {
            Ok(list) => {
                let count = list.len();
                let mut state = self.lock();
                state.orders = list;
                state.alert = None;
                state.last_updated = Some(Utc::now());
                state.apply_filter();
                info!(count, "Board reloaded");
                Ok(count)
            }
            Err(err) if err.is_superseded() => {
                debug!("Reload superseded");
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "Reload failed, keeping previous rows");
                self.lock().alert = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Live filter on every keystroke; no request is made.
    ///
    /// Surrounding whitespace is dropped, so "A1 " matches like "A1".
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut state = self.lock();
        state.query = query.trim().to_string();
        state.apply_filter();
    }

    /// Validates one order, then reloads the whole list on success.
    ///
    /// On failure the alert shows the backend message and the rows stay as they were.
    pub async fn transition(&self, order_id: OrderId, payload: TransitionPayload) -> TransitionOutcome {
        let outcome = self
            .action
            .execute(order_id, payload, |_| async {
                if let Err(err) = self.reload().await {
                    if !err.is_superseded() {
                        warn!(error = %err, "Reload after transition failed");
                    }
                }
            })
            .await;

        if let TransitionOutcome::Failed { message, .. } = &outcome {
            self.lock().alert = Some(message.clone());
        }
        outcome
    }

    /// Runs `f` against the table (sort, paging, selection).
    pub fn with_table<T>(&self, f: impl FnOnce(&mut TableView<Order>) -> T) -> T {
        f(&mut self.lock().table)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let state = self.lock();
        let config = self.stage.config();
        BoardSnapshot {
            stage: self.stage,
            label: config.label,
            color: config.color,
            query: state.query.clone(),
            loaded: state.orders.len(),
            matching: state.table.filtered_count(),
            page: state.table.page(),
            page_count: state.table.page_count(),
            page_size: state.table.page_size(),
            rows: state.table.visible().into_iter().cloned().collect(),
            selected: state.table.selected(),
            notice: state.notice.clone(),
            alert: state.alert.clone(),
            last_updated: state.last_updated,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
