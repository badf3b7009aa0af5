//! Top-level executor loop

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::order::OrderOutcome;
use super::pipeline::ExecutionPipeline;
use crate::aggregation::{AggregationBuffer, MergeOutcome, ReadinessEvaluator};
use crate::common::traits::TradeStore;
use crate::common::types::TradeEvent;
use crate::config::types::ExecutorConfig;

/// Lifecycle of the executor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Initializing,
    Running,
    Stopping,
    Stopped,
}

/// Stop signal for a running executor. Cloneable; any clone can stop the loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request a stop. The current iteration finishes; no new one starts.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// What one loop iteration did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unprocessed trades read from the store
    pub events_read: usize,
    /// Trades newly opened or merged into the buffer
    pub events_merged: usize,
    pub batches_ready: usize,
    pub orders_submitted: usize,
    pub orders_skipped: usize,
    pub batches_failed: usize,
    pub heartbeat: bool,
}

/// Totals across the life of the loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorSummary {
    pub cycles: u64,
    pub heartbeats: u64,
    pub orders_submitted: u64,
    pub orders_skipped: u64,
    pub batches_failed: u64,
}

impl ExecutorSummary {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.heartbeats += u64::from(report.heartbeat);
        self.orders_submitted += report.orders_submitted as u64;
        self.orders_skipped += report.orders_skipped as u64;
        self.batches_failed += report.batches_failed as u64;
    }
}

/// Single-worker loop: poll the store, aggregate, evaluate, execute, sleep.
///
/// Owns the aggregation buffer outright; nothing else mutates it.
pub struct Executor {
    config: ExecutorConfig,
    store: Arc<dyn TradeStore>,
    pipeline: ExecutionPipeline,
    buffer: AggregationBuffer,
    evaluator: ReadinessEvaluator,
    request_timeout: Duration,
    state: ExecutorState,
    last_check: Instant,
    handle: ShutdownHandle,
    shutdown: watch::Receiver<bool>,
}

impl Executor {
    pub fn new(
        config: ExecutorConfig,
        store: Arc<dyn TradeStore>,
        pipeline: ExecutionPipeline,
        request_timeout: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(false);
        let evaluator =
            ReadinessEvaluator::new(config.aggregation_window(), config.aggregation_min_total_usd);

        Self {
            config,
            store,
            pipeline,
            buffer: AggregationBuffer::new(),
            evaluator,
            request_timeout,
            state: ExecutorState::Initializing,
            last_check: Instant::now(),
            handle: ShutdownHandle { tx: Arc::new(tx) },
            shutdown: rx,
        }
    }

    /// Handle onto this executor's stop signal
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn buffer(&self) -> &AggregationBuffer {
        &self.buffer
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run until the shutdown handle fires
    pub async fn run(&mut self) -> ExecutorSummary {
        self.start();
        let mut summary = ExecutorSummary::default();

        while !self.shutdown_requested() {
            let report = self.run_cycle().await;
            summary.record(&report);

            let delay = self.config.loop_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => {}
            }
        }

        self.finish(&summary);
        summary
    }

    /// Run exactly one iteration, then stop
    pub async fn run_once(&mut self) -> ExecutorSummary {
        self.start();
        let mut summary = ExecutorSummary::default();
        let report = self.run_cycle().await;
        summary.record(&report);
        self.finish(&summary);
        summary
    }

    fn start(&mut self) {
        self.state = ExecutorState::Initializing;
        info!(
            traders = self.config.user_addresses.len(),
            aggregation = self.config.aggregation_enabled,
            window_secs = self.config.aggregation_window_seconds,
            min_total = %self.config.aggregation_min_total_usd,
            "Trade executor started"
        );
        if !self.config.aggregation_enabled {
            warn!("Aggregation disabled; trades are read but no batches are executed");
        }
        self.last_check = Instant::now();
        self.state = ExecutorState::Running;
    }

    fn finish(&mut self, summary: &ExecutorSummary) {
        self.state = ExecutorState::Stopping;
        if !self.buffer.is_empty() {
            // In-memory only; these trades stay unprocessed in the store.
            warn!(
                aggregates = self.buffer.len(),
                trades = self.buffer.pending_trade_count(),
                "Dropping open aggregates on shutdown"
            );
        }
        self.state = ExecutorState::Stopped;
        info!(
            cycles = summary.cycles,
            submitted = summary.orders_submitted,
            failed = summary.batches_failed,
            "Trade executor stopped"
        );
    }

    /// One pass of the loop body, excluding the inter-cycle delay
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let events = self.read_unprocessed().await;
        report.events_read = events.len();

        // Without aggregation there are no batches this cycle
        let batches = if self.config.aggregation_enabled {
            if !events.is_empty() {
                self.aggregate(events, Utc::now(), &mut report);
            }
            self.evaluator
                .evaluate(&mut self.buffer, self.store.as_ref(), Utc::now())
                .await
        } else {
            Vec::new()
        };

        report.batches_ready = batches.len();
        if !batches.is_empty() {
            for batch in &batches {
                match self.pipeline.execute(batch).await {
                    Ok(OrderOutcome::Submitted { .. }) => report.orders_submitted += 1,
                    Ok(OrderOutcome::Skipped { .. }) => report.orders_skipped += 1,
                    Err(e) => {
                        report.batches_failed += 1;
                        error!(
                            market = batch.label(),
                            error = %e,
                            transient = e.is_transient(),
                            "Execution failed for batch"
                        );
                    }
                }
            }
            self.last_check = Instant::now();
        }

        if self.last_check.elapsed() > self.config.heartbeat_interval() {
            info!(
                open_aggregates = self.buffer.len(),
                "Waiting for more trades"
            );
            report.heartbeat = true;
            self.last_check = Instant::now();
        }

        report
    }

    async fn read_unprocessed(&self) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        for address in &self.config.user_addresses {
            // One bounded read per tracked address; a failed read skips that address this cycle
            match tokio::time::timeout(self.request_timeout, self.store.find_unprocessed(address)).await {
                Ok(Ok(trades)) => events.extend(trades),
                Ok(Err(e)) => warn!(address = %address, error = %e, "Failed to read trades"),
                Err(_) => warn!(address = %address, "Timed out reading trades"),
            }
        }
        events
    }

    fn aggregate(&mut self, events: Vec<TradeEvent>, now: DateTime<Utc>, report: &mut CycleReport) {
        for event in events {
            match self.buffer.merge_at(event, now) {
                MergeOutcome::Opened | MergeOutcome::Merged => report.events_merged += 1,
                MergeOutcome::Duplicate => {}
            }
        }
        if report.events_merged > 0 {
            info!(
                count = report.events_merged,
                open_aggregates = self.buffer.len(),
                "{} new trade(s) added to aggregation buffer",
                report.events_merged
            );
        } else {
            debug!(open_aggregates = self.buffer.len(), "No new trades");
        }
    }
}
