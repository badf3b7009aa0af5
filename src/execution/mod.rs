//! Execution module - turns ready aggregates into copy orders
//!
//! The [`Executor`] drives one cycle at a time: read unprocessed trades,
//! merge them into the aggregation buffer, evaluate readiness, and hand each
//! ready aggregate to the [`ExecutionPipeline`]. Order sizing lives with the
//! order client ([`sizing`]), not in the pipeline.

pub mod dry_run;
pub mod executor;
pub mod order;
pub mod pipeline;
pub mod sizing;

pub use dry_run::DryRunOrderExecutor;
pub use executor::{CycleReport, Executor, ExecutorState, ExecutorSummary, ShutdownHandle};
pub use order::{OrderOutcome, OrderRequest, SyntheticOrder};
pub use pipeline::{ExecutionPipeline, PipelineDeps};
pub use sizing::{size_order, SizingDecision};
