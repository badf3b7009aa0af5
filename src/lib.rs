//! Polymarket copy executor
//!
//! Buffers a followed trader's activity into time-windowed aggregates per
//! market, outcome and side, then places one proportionally sized copy order
//! per aggregate that clears the minimum notional.

pub mod aggregation;
pub mod common;
pub mod config;
pub mod execution;
pub mod polymarket;
pub mod store;

// Re-export commonly used types
pub use aggregation::{AggregatedTrade, AggregationBuffer, AggregationKey, ReadinessEvaluator};
pub use common::errors::{EngineError, Result};
pub use common::types::{Position, Side, TradeEvent};
pub use config::types::AppConfig;
pub use execution::{DryRunOrderExecutor, ExecutionPipeline, Executor, ShutdownHandle};
pub use polymarket::{ClobOrderClient, DataApiClient, RpcBalanceClient};
pub use store::{InMemoryTradeStore, PgTradeStore};
