//! In-memory aggregation buffer

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use super::key::{derive_key, AggregationKey};
use super::state::AggregatedTrade;
use crate::common::types::TradeEvent;

/// What a merge did with the delivered trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First trade for its key; a new aggregate was opened
    Opened,
    /// Folded into an existing aggregate
    Merged,
    /// Already part of the live aggregate; ignored
    Duplicate,
}

/// Key → aggregate table owned by the executor loop.
///
/// Iteration follows first-seen order of keys, which fixes the order the
/// readiness evaluator scans and emits aggregates in.
#[derive(Debug, Default)]
pub struct AggregationBuffer {
    entries: IndexMap<AggregationKey, AggregatedTrade>,
}

impl AggregationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a trade using the current wall clock
    pub fn merge(&mut self, event: TradeEvent) -> MergeOutcome {
        self.merge_at(event, Utc::now())
    }

    /// Merge a trade as of `now`.
    ///
    /// Trades stay unprocessed in the store while their aggregate is open, so
    /// every poll redelivers them; a trade id already inside the live
    /// aggregate is skipped.
    pub fn merge_at(&mut self, event: TradeEvent, now: DateTime<Utc>) -> MergeOutcome {
        let key = derive_key(&event);

        match self.entries.get_mut(&key) {
            Some(aggregate) if aggregate.contains_trade(&event.id) => MergeOutcome::Duplicate,
            Some(aggregate) => {
                aggregate.absorb(event, now);
                debug!(
                    key = %key,
                    trades = aggregate.trade_count(),
                    total = %aggregate.total_size,
                    "Merged trade into aggregate"
                );
                MergeOutcome::Merged
            }
            None => {
                debug!(key = %key, total = %event.usdc_size, "Opened aggregate");
                self.entries.insert(key, AggregatedTrade::open(event, now));
                MergeOutcome::Opened
            }
        }
    }

    /// Ordered view of the live aggregates
    pub fn snapshot(&self) -> impl Iterator<Item = (&AggregationKey, &AggregatedTrade)> {
        self.entries.iter()
    }

    pub fn get(&self, key: &AggregationKey) -> Option<&AggregatedTrade> {
        self.entries.get(key)
    }

    /// Remove an aggregate; removing an absent key is a no-op
    pub fn remove(&mut self, key: &AggregationKey) -> Option<AggregatedTrade> {
        // shift_remove keeps the remaining keys in first-seen order
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Trades held across all live aggregates
    pub fn pending_trade_count(&self) -> usize {
        self.entries.values().map(|a| a.trade_count()).sum()
    }
}
