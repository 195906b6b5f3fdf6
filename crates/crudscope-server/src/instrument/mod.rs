//! Request instrumentation: every item handler runs inside the
//! [`Interceptor`], which applies simulation directives, resolves the outcome
//! code, and records it into [`HttpMetrics`](crate::obs::HttpMetrics) exactly
//! once.

pub mod interceptor;
pub mod reply;
pub mod simulation;
pub mod status;

pub use interceptor::{Interceptor, SimulationPolicy};
pub use reply::Reply;
pub use simulation::Simulation;
