//! HTTP handlers for the item collection.

pub mod items;

use axum::{response::IntoResponse, Json};
use serde_json::json;

pub use items::{ITEMS_ROUTE, ITEM_ROUTE};

pub async fn index() -> impl IntoResponse {
    Json(json!({ "message": "crudscope item service with Prometheus metrics" }))
}
