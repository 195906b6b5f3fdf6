//! Item CRUD endpoints. Every handler runs inside the interceptor under a
//! fixed route label so path parameters never leak into metric labels.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::Method,
};
use bytes::Bytes;
use serde_json::{Map, Value};

use crudscope_core::error::{CrudError, Result};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::instrument::{Reply, Simulation};
use crate::store::ItemStore;

pub const ITEMS_ROUTE: &str = "/items";
pub const ITEM_ROUTE: &str = "/items/<id>";

type HandlerResult = std::result::Result<Reply, ApiError>;

pub async fn list_items(
    State(state): State<AppState>,
    method: Method,
    Simulation(directive): Simulation,
) -> HandlerResult {
    let store = state.store();
    let reply = state
        .interceptor()
        .run(method.as_str(), ITEMS_ROUTE, directive, move || list(store))
        .await?;
    Ok(reply)
}

pub async fn create_item(
    State(state): State<AppState>,
    method: Method,
    Simulation(directive): Simulation,
    body: std::result::Result<Bytes, BytesRejection>,
) -> HandlerResult {
    let store = state.store();
    let body = body.map_err(body_rejected);
    let reply = state
        .interceptor()
        .run(method.as_str(), ITEMS_ROUTE, directive, move || {
            create(store, body)
        })
        .await?;
    Ok(reply)
}

pub async fn get_item(
    State(state): State<AppState>,
    method: Method,
    raw_id: std::result::Result<Path<String>, PathRejection>,
    Simulation(directive): Simulation,
) -> HandlerResult {
    let store = state.store();
    let raw_id = raw_id.map(|Path(id)| id).map_err(path_rejected);
    let reply = state
        .interceptor()
        .run(method.as_str(), ITEM_ROUTE, directive, move || get(store, raw_id))
        .await?;
    Ok(reply)
}

pub async fn update_item(
    State(state): State<AppState>,
    method: Method,
    raw_id: std::result::Result<Path<String>, PathRejection>,
    Simulation(directive): Simulation,
    body: std::result::Result<Bytes, BytesRejection>,
) -> HandlerResult {
    let store = state.store();
    let raw_id = raw_id.map(|Path(id)| id).map_err(path_rejected);
    let body = body.map_err(body_rejected);
    let reply = state
        .interceptor()
        .run(method.as_str(), ITEM_ROUTE, directive, move || {
            update(store, raw_id, body)
        })
        .await?;
    Ok(reply)
}

pub async fn delete_item(
    State(state): State<AppState>,
    method: Method,
    raw_id: std::result::Result<Path<String>, PathRejection>,
    Simulation(directive): Simulation,
) -> HandlerResult {
    let store = state.store();
    let raw_id = raw_id.map(|Path(id)| id).map_err(path_rejected);
    let reply = state
        .interceptor()
        .run(method.as_str(), ITEM_ROUTE, directive, move || {
            delete(store, raw_id)
        })
        .await?;
    Ok(reply)
}

async fn list(store: Arc<dyn ItemStore>) -> Result<Reply> {
    let items = store.list().await;
    Ok(Reply::Body(to_json(&items)?))
}

async fn create(store: Arc<dyn ItemStore>, body: Result<Bytes>) -> Result<Reply> {
    let data = parse_body(&body?)?;
    let item = store.create(data).await;
    Ok(Reply::WithCode(to_json(&item)?, 201))
}

async fn get(store: Arc<dyn ItemStore>, raw_id: Result<String>) -> Result<Reply> {
    let raw_id = raw_id?;
    let item = store.get(parse_id(&raw_id)?).await?;
    Ok(Reply::Body(to_json(&item)?))
}

async fn update(
    store: Arc<dyn ItemStore>,
    raw_id: Result<String>,
    body: Result<Bytes>,
) -> Result<Reply> {
    let id = parse_id(&raw_id?)?;
    let data = parse_body(&body?)?;
    let item = store.update(id, data).await?;
    Ok(Reply::Body(to_json(&item)?))
}

async fn delete(store: Arc<dyn ItemStore>, raw_id: Result<String>) -> Result<Reply> {
    store.delete(parse_id(&raw_id?)?).await?;
    Ok(Reply::WithCode(Value::Null, 204))
}

// Extractor rejections are carried into the interceptor so they are recorded
// under the status axum would have answered with.
fn body_rejected(r: BytesRejection) -> CrudError {
    CrudError::status_error(r.status().as_u16(), r.body_text())
}

fn path_rejected(r: PathRejection) -> CrudError {
    CrudError::status_error(r.status().as_u16(), r.body_text())
}

/// Non-numeric ids address nothing, so they resolve like a missing item.
fn parse_id(raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| CrudError::NotFound)
}

/// An empty or falsy JSON body means `{}`.
fn parse_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let v: Value = serde_json::from_slice(body)
        .map_err(|e| CrudError::BadRequest(format!("invalid json body: {e}")))?;
    if is_falsy(&v) {
        return Ok(Value::Object(Map::new()));
    }
    Ok(v)
}

fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(v: &T) -> Result<Value> {
    serde_json::to_value(v).map_err(|e| CrudError::Internal(format!("serialize failed: {e}")))
}
