//! Axum router wiring.

use axum::{routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{app_state::AppState, handlers, handlers::items, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
        // a resumed handler panic still becomes a 500 for the client
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}
