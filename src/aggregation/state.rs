//! Running aggregate for one aggregation key

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::key::effective_side;
use crate::common::types::{Side, TradeEvent};

/// Trades sharing one aggregation key, coalesced while their window is open
#[derive(Debug, Clone)]
pub struct AggregatedTrade {
    pub user_address: String,
    pub condition_id: String,
    pub asset: String,
    pub side: Side,
    pub slug: Option<String>,
    pub event_slug: Option<String>,
    /// Constituents in arrival order; never empty
    constituents: Vec<TradeEvent>,
    trade_ids: HashSet<String>,
    /// Sum of constituent USDC sizes
    pub total_size: Decimal,
    /// Size-weighted mean of constituent prices
    pub average_price: Decimal,
    /// When the buffer first saw activity for this key
    pub window_start: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl AggregatedTrade {
    /// Open a new aggregate from its first trade
    pub fn open(event: TradeEvent, now: DateTime<Utc>) -> Self {
        let mut trade_ids = HashSet::new();
        trade_ids.insert(event.id.clone());

        Self {
            user_address: event.user_address.clone(),
            condition_id: event.condition_id.clone(),
            asset: event.asset.clone(),
            side: effective_side(&event),
            slug: event.slug.clone(),
            event_slug: event.event_slug.clone(),
            total_size: event.usdc_size,
            average_price: event.price,
            window_start: now,
            last_activity: now,
            constituents: vec![event],
            trade_ids,
        }
    }

    /// Fold another trade into the aggregate.
    ///
    /// The average is updated incrementally so the cost stays O(1) however
    /// many constituents the aggregate holds.
    pub fn absorb(&mut self, event: TradeEvent, now: DateTime<Utc>) {
        let new_total = self.total_size + event.usdc_size;
        if !new_total.is_zero() {
            self.average_price =
                (self.average_price * self.total_size + event.price * event.usdc_size) / new_total;
        }
        self.total_size = new_total;
        self.last_activity = now;
        self.trade_ids.insert(event.id.clone());
        self.constituents.push(event);
    }

    pub fn contains_trade(&self, trade_id: &str) -> bool {
        self.trade_ids.contains(trade_id)
    }

    pub fn constituents(&self) -> &[TradeEvent] {
        &self.constituents
    }

    /// First constituent, used as the template for the synthetic order
    pub fn first_trade(&self) -> &TradeEvent {
        &self.constituents[0]
    }

    pub fn trade_count(&self) -> usize {
        self.constituents.len()
    }

    /// Total outcome shares across constituents
    pub fn total_shares(&self) -> Decimal {
        self.constituents.iter().map(|t| t.size).sum()
    }

    pub fn label(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.asset)
    }
}
