//! Last-issued-wins gate for overlapping fetches.

use std::future::Future;
use std::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::errors::ClientError;

#[derive(Debug, Default)]
struct GateState {
    issued: u64,
    in_flight: Option<AbortHandle>,
}

/// Serializes the *outcome* of fetches issued for one view.
///
/// Starting a fetch aborts the one still in flight, and a fetch only
/// resolves to its value if no newer fetch was issued meanwhile. Anything
/// else resolves to [`ClientError::Superseded`], which callers drop silently.
#[derive(Debug, Default)]
pub struct FetchGate {
    state: Mutex<GateState>,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches issued so far; the newest one holds this ticket.
    pub fn latest(&self) -> u64 {
        self.lock().issued
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest() == ticket
    }

    /// Spawns `fetch` as the newest request and waits for it.
    pub async fn run<F, T>(&self, fetch: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
    {
        let (ticket, handle) = {
            let mut state = self.lock();
            state.issued += 1;
            let handle = tokio::spawn(fetch);
            if let Some(previous) = state.in_flight.replace(handle.abort_handle()) {
                previous.abort();
            }
            (state.issued, handle)
        };

        let outcome = handle.await;

        {
            let mut state = self.lock();
            if state.issued == ticket {
                state.in_flight = None;
            }
        }

        match outcome {
            Err(join_err) if join_err.is_cancelled() => {
                debug!(ticket, "Fetch aborted by a newer one");
                Err(ClientError::Superseded)
            }
            Err(join_err) => Err(ClientError::Internal(format!("fetch task failed: {join_err}"))),
            Ok(_) if !self.is_current(ticket) => {
                debug!(ticket, "Discarding stale response");
                Err(ClientError::Superseded)
            }
            Ok(result) => result,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
