//! Readiness evaluation of buffered aggregates

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use super::buffer::AggregationBuffer;
use super::key::AggregationKey;
use super::state::AggregatedTrade;
use crate::common::traits::TradeStore;

/// Classification of one aggregate at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Window still running
    Open,
    /// Window elapsed and the total meets the minimum
    Ready,
    /// Window elapsed below the minimum; constituents get discarded
    BelowThreshold,
}

/// Decides when buffered aggregates are done and evicts them
#[derive(Debug, Clone)]
pub struct ReadinessEvaluator {
    window: Duration,
    minimum_total: Decimal,
}

impl ReadinessEvaluator {
    pub fn new(window: Duration, minimum_total: Decimal) -> Self {
        Self {
            window,
            minimum_total,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn minimum_total(&self) -> Decimal {
        self.minimum_total
    }

    /// Classify an aggregate as of `now`. The window bound and the minimum are both inclusive.
    pub fn classify(&self, aggregate: &AggregatedTrade, now: DateTime<Utc>) -> Readiness {
        // A clock that moved backwards counts as no time elapsed.
        let elapsed = (now - aggregate.window_start).to_std().unwrap_or_default();
        if elapsed < self.window {
            Readiness::Open
        } else if aggregate.total_size >= self.minimum_total {
            Readiness::Ready
        } else {
            Readiness::BelowThreshold
        }
    }

    /// Scan the buffer once, evicting every terminal aggregate.
    ///
    /// Returns ready aggregates in buffer order. Below-threshold aggregates
    /// have their constituents flagged as filtered in the store. Each entry
    /// leaves the buffer before it is acted on, so no aggregate is ever
    /// classified twice.
    pub async fn evaluate(
        &self,
        buffer: &mut AggregationBuffer,
        store: &dyn TradeStore,
        now: DateTime<Utc>,
    ) -> Vec<AggregatedTrade> {
        // Classify against a snapshot first, then evict
        let terminal: Vec<(AggregationKey, Readiness)> = buffer
            .snapshot()
            .map(|(key, aggregate)| (key.clone(), self.classify(aggregate, now)))
            .filter(|(_, readiness)| *readiness != Readiness::Open)
            .collect();

        let mut ready = Vec::new();
        for (key, readiness) in terminal {
            let Some(aggregate) = buffer.remove(&key) else {
                continue;
            };

            match readiness {
                Readiness::Ready => {
                    info!(
                        market = aggregate.label(),
                        side = %aggregate.side,
                        trades = aggregate.trade_count(),
                        total = %aggregate.total_size,
                        avg_price = %aggregate.average_price,
                        "Aggregate ready"
                    );
                    ready.push(aggregate);
                }
                Readiness::BelowThreshold => self.discard(&aggregate, store).await,
                Readiness::Open => {}
            }
        }
        ready
    }

    async fn discard(&self, aggregate: &AggregatedTrade, store: &dyn TradeStore) {
        info!(
            market = aggregate.label(),
            side = %aggregate.side,
            trades = aggregate.trade_count(),
            total = %aggregate.total_size,
            minimum = %self.minimum_total,
            "Aggregate below minimum, discarding {} trade(s) totalling ${}",
            aggregate.trade_count(),
            aggregate.total_size
        );

        for trade in aggregate.constituents() {
            if let Err(e) = store.mark_filtered(&trade.user_address, &trade.id).await {
                // Left unprocessed; the next poll re-reads it into a fresh aggregate.
                warn!(trade_id = %trade.id, error = %e, "Failed to flag discarded trade");
            }
        }
    }
}
