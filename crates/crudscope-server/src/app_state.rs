//! Shared application state for the crudscope server.
//!
//! The metrics registry is created here once and lives as long as the
//! process; handlers reach it only through the interceptor and the
//! `/metrics` endpoint.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::instrument::Interceptor;
use crate::obs::HttpMetrics;
use crate::store::{InMemoryItemStore, ItemStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AppConfig,
    metrics: Arc<HttpMetrics>,
    store: Arc<dyn ItemStore>,
    interceptor: Interceptor,
}

impl AppState {
    /// Build state backed by an empty in-memory store.
    pub fn new(cfg: AppConfig) -> Self {
        Self::with_store(cfg, Arc::new(InMemoryItemStore::new()))
    }

    pub fn with_store(cfg: AppConfig, store: Arc<dyn ItemStore>) -> Self {
        let metrics = Arc::new(HttpMetrics::new());
        let interceptor = Interceptor::new(Arc::clone(&metrics), cfg.simulation.policy());
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                store,
                interceptor,
            }),
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<HttpMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn store(&self) -> Arc<dyn ItemStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.inner.interceptor
    }
}
