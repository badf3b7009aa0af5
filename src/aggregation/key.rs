//! Grouping key for trade aggregation

use serde::{Deserialize, Serialize};

use crate::common::types::{Side, TradeEvent};

/// Identifies one intended position change: `(address, market, asset, side)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregationKey(String);

impl AggregationKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side used when the source record carries none
pub const DEFAULT_SIDE: Side = Side::Buy;

/// Effective side of a trade event
pub fn effective_side(event: &TradeEvent) -> Side {
    event.side.unwrap_or(DEFAULT_SIDE)
}

/// Derive the aggregation key for a trade event
pub fn derive_key(event: &TradeEvent) -> AggregationKey {
    AggregationKey(format!(
        "{}:{}:{}:{}",
        event.user_address,
        event.condition_id,
        event.asset,
        effective_side(event)
    ))
}
