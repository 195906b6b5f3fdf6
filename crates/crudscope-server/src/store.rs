//! In-memory item collection.
//!
//! Ids come from a monotonically increasing sequence and are never reused,
//! even after a delete.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

use crudscope_core::error::{CrudError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u64,
    pub data: Value,
}

/// Record storage used by the item handlers.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items, ordered by id.
    async fn list(&self) -> Vec<Item>;
    async fn create(&self, data: Value) -> Item;
    async fn get(&self, id: u64) -> Result<Item>;
    /// Replace the item's data wholesale.
    async fn update(&self, id: u64, data: Value) -> Result<Item>;
    async fn delete(&self, id: u64) -> Result<()>;
}

pub struct InMemoryItemStore {
    items: DashMap<u64, Item>,
    seq: AtomicU64,
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.iter().map(|r| r.value().clone()).collect();
        items.sort_by_key(|it| it.id);
        items
    }

    async fn create(&self, data: Value) -> Item {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        let item = Item { id, data };
        self.items.insert(id, item.clone());
        item
    }

    async fn get(&self, id: u64) -> Result<Item> {
        self.items
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(CrudError::NotFound)
    }

    async fn update(&self, id: u64, data: Value) -> Result<Item> {
        let mut entry = self.items.get_mut(&id).ok_or(CrudError::NotFound)?;
        entry.data = data;
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.items
            .remove(&id)
            .map(|_| ())
            .ok_or(CrudError::NotFound)
    }
}
