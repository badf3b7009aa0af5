//! Shared types used across the store, aggregation and execution layers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::EngineError;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(EngineError::InvalidResponse(format!("Unknown side: {}", other))),
        }
    }
}

/// One observed trade by one tracked counterparty, as persisted by the ingestion side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Unique record identifier (transaction hash for on-chain fills)
    pub id: String,
    /// Tracked address that made the trade
    pub user_address: String,
    /// Market/condition identifier
    pub condition_id: String,
    /// Outcome token identifier
    pub asset: String,
    /// Side of the trade; absent on some legacy records
    #[serde(default)]
    pub side: Option<Side>,
    /// Traded notional in USDC
    pub usdc_size: Decimal,
    /// Outcome shares traded
    #[serde(default)]
    pub size: Decimal,
    /// Unit price (0.00 to 1.00)
    pub price: Decimal,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    /// Exchange timestamp in unix seconds
    pub timestamp: i64,
    /// Set once the trade was discarded as non-actionable
    #[serde(default)]
    pub filtered: bool,
    /// Set once the trade was handed to the execution pipeline
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
}

impl TradeEvent {
    /// Display label for logs: slug when known, asset id otherwise
    pub fn label(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.asset)
    }

    /// Whether the trade is still waiting for the executor
    pub fn is_unprocessed(&self) -> bool {
        !self.filtered && self.executed_at.is_none()
    }
}

/// Open position as reported by the Polymarket Data API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub proxy_wallet: String,
    pub asset: String,
    pub condition_id: String,
    /// Outcome shares held
    pub size: Decimal,
    #[serde(default)]
    pub avg_price: Decimal,
    #[serde(default)]
    pub initial_value: Decimal,
    /// Mark-to-market value in USDC
    #[serde(default)]
    pub current_value: Decimal,
    #[serde(default)]
    pub cur_price: Decimal,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
}

/// Aggregate portfolio value: the sum of position current values
pub fn portfolio_value(positions: &[Position]) -> Decimal {
    positions.iter().map(|p| p.current_value).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_parsing() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(" SELL ".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn test_position_deserializes_data_api_payload() {
        let json = r#"{
            "proxyWallet": "0xabc",
            "asset": "token_yes",
            "conditionId": "0xcond",
            "size": 120.5,
            "avgPrice": 0.42,
            "initialValue": 50.61,
            "currentValue": 60.25,
            "curPrice": 0.5,
            "title": "Will it rain tomorrow?",
            "outcome": "Yes"
        }"#;

        let position: Position = serde_json::from_str(json).unwrap();
        assert_eq!(position.condition_id, "0xcond");
        assert_eq!(position.size, dec!(120.5));
        assert_eq!(position.current_value, dec!(60.25));
        assert!(position.slug.is_none());
    }

    #[test]
    fn test_portfolio_value_sums_current_values() {
        let base: Position = serde_json::from_str(
            r#"{"asset":"a","conditionId":"c","size":1,"currentValue":10.5}"#,
        )
        .unwrap();
        let mut other = base.clone();
        other.current_value = dec!(4.5);

        assert_eq!(portfolio_value(&[base, other]), dec!(15.0));
        assert_eq!(portfolio_value(&[]), Decimal::ZERO);
    }
}
