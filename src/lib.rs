//! Orderflow client library
//!
//! Typed access to the warehouse order workflow backend: authentication and
//! session persistence, the three stage queues (preparation, control,
//! packing), order and user administration, and the statistics derived from
//! order timestamps.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod queries;
pub mod reports;
pub mod services;
pub mod views;

pub use client::ApiClient;
pub use config::{load_config, AppConfig};
pub use errors::ClientError;
