//! Aggregation module - coalesces trade events into time-windowed aggregates
//!
//! ```text
//! TradeEvent ──derive_key──▶ AggregationBuffer ──per cycle──▶ ReadinessEvaluator
//!                              (merge, O(1))                  ├─ Ready          → execution
//!                                                             ├─ BelowThreshold → flagged filtered
//!                                                             └─ Open           → stays buffered
//! ```

pub mod buffer;
pub mod evaluator;
pub mod key;
pub mod state;

pub use buffer::{AggregationBuffer, MergeOutcome};
pub use evaluator::{Readiness, ReadinessEvaluator};
pub use key::{derive_key, AggregationKey};
pub use state::AggregatedTrade;
