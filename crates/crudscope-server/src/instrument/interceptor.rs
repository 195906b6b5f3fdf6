//! Request Interceptor.
//!
//! Wraps one handler invocation for a `(method, route)` pair:
//! - starts the clock (injected delay is part of the measured time)
//! - applies the simulation directive (delay, forced failure)
//! - runs the handler unless the directive short-circuited it
//! - resolves the outcome code and records it exactly once
//! - hands the result back unchanged, or resumes a handler panic
//!
//! The body runs on its own task, so a dropped caller never skips recording.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::Instant;

use crudscope_core::{CrudError, SimulationDirective};

use super::reply::Reply;
use super::status::{self, UNEXPECTED_CODE};
use crate::obs::{HttpMetrics, RequestOutcome};

/// Server-side limits applied to client-supplied directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPolicy {
    pub enabled: bool,
    pub max_delay: Duration,
}

impl Default for SimulationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl SimulationPolicy {
    pub fn apply(&self, directive: SimulationDirective) -> SimulationDirective {
        if !self.enabled {
            return SimulationDirective::default();
        }
        directive.capped(self.max_delay)
    }
}

#[derive(Clone)]
pub struct Interceptor {
    metrics: Arc<HttpMetrics>,
    simulation: SimulationPolicy,
}

impl Interceptor {
    pub fn new(metrics: Arc<HttpMetrics>, simulation: SimulationPolicy) -> Self {
        Self {
            metrics,
            simulation,
        }
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }

    /// Run `handler` under instrumentation.
    ///
    /// The instrumented body runs as its own task, so dropping the returned
    /// future (client gone, outer timeout) does not stop the request short of
    /// the recording step.
    pub async fn run<F, Fut>(
        &self,
        method: &str,
        route: &str,
        directive: SimulationDirective,
        handler: F,
    ) -> Result<Reply, CrudError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Reply, CrudError>> + Send + 'static,
    {
        let directive = self.simulation.apply(directive);
        let metrics = Arc::clone(&self.metrics);
        let labels = (method.to_owned(), route.to_owned());

        let task = tokio::spawn(async move {
            let start = Instant::now();
            let caught = AssertUnwindSafe(invoke(directive, handler))
                .catch_unwind()
                .await;

            let elapsed = start.elapsed();
            let code = match &caught {
                Ok(result) => status::resolve(result),
                Err(_) => UNEXPECTED_CODE,
            };
            let outcome = RequestOutcome {
                method: labels.0.as_str(),
                route: labels.1.as_str(),
                code,
            };
            metrics.record(&outcome, elapsed);
            (caught, code)
        });

        let (caught, code) = match task.await {
            Ok(done) => done,
            // Only reachable when the runtime shuts down under the task.
            Err(e) => {
                tracing::warn!(%method, %route, error = %e, "instrumented task did not finish");
                return Err(CrudError::Internal(format!("request task aborted: {e}")));
            }
        };

        match caught {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(err)) => {
                if err.is_expected() {
                    tracing::debug!(%method, %route, code, error = %err, "handler returned expected error");
                } else {
                    tracing::error!(%method, %route, code, error = %err, "handler failed");
                }
                Err(err)
            }
            Err(panic) => {
                tracing::error!(%method, %route, code, "handler panicked");
                std::panic::resume_unwind(panic)
            }
        }
    }
}

async fn invoke<F, Fut>(directive: SimulationDirective, handler: F) -> Result<Reply, CrudError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Reply, CrudError>>,
{
    if let Some(delay) = directive.delay {
        tokio::time::sleep(delay).await;
    }
    if directive.force_failure {
        return Err(CrudError::SimulatedFailure);
    }
    handler().await
}
