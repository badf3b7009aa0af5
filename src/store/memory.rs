//! In-memory trade store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::errors::Result;
use crate::common::traits::TradeStore;
use crate::common::types::TradeEvent;

/// Trade store kept in process memory, one collection per address.
///
/// Used for dry runs and tests; clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTradeStore {
    collections: Arc<RwLock<HashMap<String, Vec<TradeEvent>>>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a trade, as the ingestion side would. Existing ids are left untouched.
    pub async fn insert(&self, event: TradeEvent) {
        let mut collections = self.collections.write().await;
        let collection = collections
            .entry(event.user_address.to_lowercase())
            .or_default();
        if !collection.iter().any(|t| t.id == event.id) {
            collection.push(event);
        }
    }

    pub async fn get(&self, address: &str, trade_id: &str) -> Option<TradeEvent> {
        let collections = self.collections.read().await;
        collections
            .get(&address.to_lowercase())
            .and_then(|c| c.iter().find(|t| t.id == trade_id).cloned())
    }

    /// Every trade recorded for an address, processed or not
    pub async fn all(&self, address: &str) -> Vec<TradeEvent> {
        let collections = self.collections.read().await;
        collections
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    async fn update<F>(&self, address: &str, trade_id: &str, apply: F)
    where
        F: FnOnce(&mut TradeEvent),
    {
        let mut collections = self.collections.write().await;
        if let Some(trade) = collections
            .get_mut(&address.to_lowercase())
            .and_then(|c| c.iter_mut().find(|t| t.id == trade_id))
        {
            apply(trade);
        }
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn find_unprocessed(&self, address: &str) -> Result<Vec<TradeEvent>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&address.to_lowercase())
            .map(|c| c.iter().filter(|t| t.is_unprocessed()).cloned().collect())
            .unwrap_or_default())
    }

    async fn mark_filtered(&self, address: &str, trade_id: &str) -> Result<()> {
        self.update(address, trade_id, |t| t.filtered = true).await;
        Ok(())
    }

    async fn mark_executed(&self, address: &str, trade_ids: &[String], at: DateTime<Utc>) -> Result<()> {
        // One write lock for the whole batch
        let mut collections = self.collections.write().await;
        if let Some(collection) = collections.get_mut(&address.to_lowercase()) {
            for trade in collection.iter_mut().filter(|t| trade_ids.contains(&t.id)) {
                trade.executed_at.get_or_insert(at);
            }
        }
        Ok(())
    }
}
