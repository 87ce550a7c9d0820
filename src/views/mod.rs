//! Screen state that sits between the services and whatever renders it.
//!
//! Nothing in here draws anything: a board or a table is plain data plus the
//! operations a page performs on it, so the CLI and the tests drive the same
//! code paths.

pub mod fetch_gate;
pub mod poller;
pub mod reference_filter;
pub mod stage_board;
pub mod table;
pub mod transition;

pub use fetch_gate::FetchGate;
pub use poller::{spawn_poller, watch, PollerHandle};
pub use reference_filter::{empty_result_notice, filter_by_reference, FilterOutcome};
pub use stage_board::{BoardSnapshot, StageBoard};
pub use table::{
    order_columns, stage_columns, Column, FieldValue, SortDirection, SortState, TableRow, TableView,
};
pub use transition::{TransitionAction, TransitionOutcome};
