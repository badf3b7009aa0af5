//! Synthetic order and order-client request/response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregation::AggregatedTrade;
use crate::common::types::{Position, Side};

/// Single order descriptor standing in for every constituent of a ready aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticOrder {
    /// Derived from the first constituent id and the constituent count
    pub id: String,
    pub user_address: String,
    pub condition_id: String,
    pub asset: String,
    pub side: Side,
    /// Aggregate notional in USDC
    pub usdc_size: Decimal,
    /// Aggregate outcome shares
    pub size: Decimal,
    /// Size-weighted average price
    pub price: Decimal,
    pub slug: Option<String>,
    pub event_slug: Option<String>,
    pub title: Option<String>,
    pub outcome: Option<String>,
    /// Exchange timestamp of the first constituent
    pub timestamp: i64,
    pub constituent_ids: Vec<String>,
}

impl SyntheticOrder {
    /// Build the order from an aggregate, using its first trade for descriptive fields
    pub fn from_aggregate(aggregate: &AggregatedTrade) -> Self {
        let template = aggregate.first_trade();
        let id = if aggregate.trade_count() == 1 {
            template.id.clone()
        } else {
            format!("agg:{}:{}", template.id, aggregate.trade_count())
        };

        Self {
            id,
            user_address: aggregate.user_address.clone(),
            condition_id: aggregate.condition_id.clone(),
            asset: aggregate.asset.clone(),
            side: aggregate.side,
            usdc_size: aggregate.total_size,
            size: aggregate.total_shares(),
            price: aggregate.average_price,
            slug: aggregate.slug.clone().or_else(|| template.slug.clone()),
            event_slug: aggregate
                .event_slug
                .clone()
                .or_else(|| template.event_slug.clone()),
            title: template.title.clone(),
            outcome: template.outcome.clone(),
            timestamp: template.timestamp,
            constituent_ids: aggregate.constituents().iter().map(|t| t.id.clone()).collect(),
        }
    }

    pub fn label(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.asset)
    }
}

/// Everything the order client needs to size and place a copy order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    /// Our position in the order's market, if any
    pub own_position: Option<Position>,
    /// The counterparty's position in the order's market, if any
    pub counterparty_position: Option<Position>,
    pub order: SyntheticOrder,
    pub own_balance: Decimal,
    /// Counterparty portfolio value (sum of position current values)
    pub counterparty_balance: Decimal,
    pub counterparty_address: String,
}

/// Result of handing an order to the order client
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// Order accepted by the venue
    Submitted {
        order_id: String,
        side: Side,
        /// USDC for buys, shares for sells
        amount: Decimal,
        price: Decimal,
    },
    /// Sizing decided there is nothing to place
    Skipped { reason: String },
}

impl OrderOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, OrderOutcome::Submitted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::TradeEvent;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade(id: &str, usdc_size: Decimal, size: Decimal, price: Decimal) -> TradeEvent {
        TradeEvent {
            id: id.to_string(),
            user_address: "0xuser".to_string(),
            condition_id: "0xcond".to_string(),
            asset: "token_yes".to_string(),
            side: None,
            usdc_size,
            size,
            price,
            slug: None,
            event_slug: Some("weather".to_string()),
            title: Some("Will it rain tomorrow?".to_string()),
            outcome: Some("Yes".to_string()),
            timestamp: 1_704_067_200,
            filtered: false,
            executed_at: None,
        }
    }

    #[test]
    fn test_synthetic_order_from_aggregate() {
        let now = Utc::now();
        let mut aggregate =
            AggregatedTrade::open(trade("0xa", dec!(100), dec!(100), dec!(1.00)), now);
        aggregate.absorb(trade("0xb", dec!(50), dec!(45.45), dec!(1.10)), now);

        let order = SyntheticOrder::from_aggregate(&aggregate);

        assert_eq!(order.id, "agg:0xa:2");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.usdc_size, dec!(150));
        assert_eq!(order.size, dec!(145.45));
        assert_eq!(order.price, aggregate.average_price);
        assert_eq!(order.asset, "token_yes");
        assert_eq!(order.title.as_deref(), Some("Will it rain tomorrow?"));
        assert_eq!(order.event_slug.as_deref(), Some("weather"));
        assert_eq!(order.constituent_ids, vec!["0xa", "0xb"]);
        assert_eq!(order.label(), "token_yes");
    }

    #[test]
    fn test_single_trade_order_keeps_trade_id() {
        let aggregate =
            AggregatedTrade::open(trade("0xa", dec!(10), dec!(20), dec!(0.5)), Utc::now());
        assert_eq!(SyntheticOrder::from_aggregate(&aggregate).id, "0xa");
    }
}
