//! Incident record-keeping service.
//!
//! Clients create incidents, list and filter them, fetch one by id and move
//! them between statuses. The [`state`] module owns persistence, the
//! [`processing`] module validates requests and maps store outcomes, and
//! [`api`] exposes both over HTTP.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod processing;
pub mod state;

pub use error::{AppError, Result};
