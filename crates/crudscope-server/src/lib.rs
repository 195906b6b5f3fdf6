//! crudscope server library entry.
//!
//! An item CRUD service whose every request is timed, attributed an outcome
//! code, and folded into Prometheus-style metrics. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod instrument;
pub mod obs;
pub mod ops;
pub mod router;
pub mod store;
