//! Trait definitions for the engine's external collaborators

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::errors::Result;
use super::types::{Position, TradeEvent};
use crate::execution::order::{OrderOutcome, OrderRequest};

/// Persistent store of trade activity, one logical collection per tracked address
///
/// The ingestion side writes records; the engine only reads unprocessed
/// trades and flips their processing flags.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// All trades for `address` that are neither filtered nor executed
    async fn find_unprocessed(&self, address: &str) -> Result<Vec<TradeEvent>>;

    /// Flag a trade as non-actionable. Marking an already-flagged trade is a no-op.
    async fn mark_filtered(&self, address: &str, trade_id: &str) -> Result<()>;

    /// Record that a batch of trades was handed to the execution pipeline.
    ///
    /// All or nothing: on error no trade in `trade_ids` is marked. Trades
    /// already marked keep their original timestamp.
    async fn mark_executed(&self, address: &str, trade_ids: &[String], at: DateTime<Utc>) -> Result<()>;
}

/// Position lookups against the market data service
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Current open positions for a wallet
    async fn get_positions(&self, address: &str) -> Result<Vec<Position>>;
}

/// Available collateral lookups
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Spendable USDC balance for a wallet
    async fn get_balance(&self, address: &str) -> Result<Decimal>;
}

/// Order submission client
///
/// Receives the synthetic order together with both parties' positions and
/// balances so that sizing decisions are made on its side.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderOutcome>;
}
