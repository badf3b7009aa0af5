//! Execution of ready aggregates

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use super::order::{OrderOutcome, OrderRequest, SyntheticOrder};
use crate::aggregation::AggregatedTrade;
use crate::common::errors::{EngineError, Result};
use crate::common::traits::{BalanceService, MarketDataService, OrderExecutor, TradeStore};
use crate::common::types::{portfolio_value, Position};

/// Remote collaborators the pipeline talks to
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn TradeStore>,
    pub market_data: Arc<dyn MarketDataService>,
    pub balances: Arc<dyn BalanceService>,
    pub orders: Arc<dyn OrderExecutor>,
}

/// Turns one ready aggregate into one submitted order.
///
/// Constituents are marked executed before anything else happens. A crash or
/// failure after that point leaves them executed but never submitted: a copy
/// trade may be lost, but it is never placed twice.
pub struct ExecutionPipeline {
    deps: PipelineDeps,
    proxy_wallet: String,
    request_timeout: Duration,
}

impl ExecutionPipeline {
    pub fn new(deps: PipelineDeps, proxy_wallet: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            deps,
            proxy_wallet: proxy_wallet.into(),
            request_timeout,
        }
    }

    pub fn proxy_wallet(&self) -> &str {
        &self.proxy_wallet
    }

    #[instrument(skip_all, fields(market = aggregate.label(), side = %aggregate.side, trades = aggregate.trade_count()))]
    pub async fn execute(&self, aggregate: &AggregatedTrade) -> Result<OrderOutcome> {
        let trade_ids: Vec<String> = aggregate.constituents().iter().map(|t| t.id.clone()).collect();

        // 1. Mark the whole batch executed, atomically
        if let Err(e) = self
            .bounded(
                "mark batch executed",
                self.deps
                    .store
                    .mark_executed(&aggregate.user_address, &trade_ids, Utc::now()),
            )
            .await
        {
            error!(
                error = %e,
                trade_ids = ?trade_ids,
                "Failed to mark batch executed; nothing submitted, trades stay unprocessed"
            );
            return Err(e);
        }

        // 2. Fetch context and submit
        match self.fetch_and_submit(aggregate).await {
            Ok(outcome) => {
                match &outcome {
                    OrderOutcome::Submitted {
                        order_id, amount, price, ..
                    } => info!(order_id = %order_id, amount = %amount, price = %price, "Copy order submitted"),
                    OrderOutcome::Skipped { reason } => info!(reason = %reason, "Copy order skipped"),
                }
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    error = %e,
                    trade_ids = ?trade_ids,
                    "Trades marked executed but the order was not submitted; they will not be retried"
                );
                Err(e)
            }
        }
    }

    async fn fetch_and_submit(&self, aggregate: &AggregatedTrade) -> Result<OrderOutcome> {
        let counterparty = aggregate.user_address.as_str();

        // Both position lookups and our balance run concurrently
        let (own_positions, counterparty_positions, own_balance) = tokio::try_join!(
            self.bounded("fetch own positions", self.deps.market_data.get_positions(&self.proxy_wallet)),
            self.bounded("fetch counterparty positions", self.deps.market_data.get_positions(counterparty)),
            self.bounded("fetch own balance", self.deps.balances.get_balance(&self.proxy_wallet)),
        )?;
        // Counterparty has no on-chain balance lookup; use its portfolio value
        let counterparty_balance = portfolio_value(&counterparty_positions);

        info!(
            own_balance = %own_balance,
            counterparty_balance = %counterparty_balance,
            "Balances fetched"
        );

        let request = OrderRequest {
            side: aggregate.side,
            own_position: matching_position(own_positions, &aggregate.condition_id),
            counterparty_position: matching_position(counterparty_positions, &aggregate.condition_id),
            order: SyntheticOrder::from_aggregate(aggregate),
            own_balance,
            counterparty_balance,
            counterparty_address: counterparty.to_string(),
        };

        self.bounded("submit order", self.deps.orders.submit(&request)).await
    }

    async fn bounded<T, F>(&self, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| EngineError::Timeout(format!("{} after {:?}", what, self.request_timeout)))?
    }
}

fn matching_position(positions: Vec<Position>, condition_id: &str) -> Option<Position> {
    positions.into_iter().find(|p| p.condition_id == condition_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::MockOrderExecutor;
    use crate::common::types::{Side, TradeEvent};
    use crate::store::InMemoryTradeStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct FixedMarketData(HashMap<String, Vec<Position>>);

    #[async_trait]
    impl MarketDataService for FixedMarketData {
        async fn get_positions(&self, address: &str) -> Result<Vec<Position>> {
            Ok(self.0.get(address).cloned().unwrap_or_default())
        }
    }

    struct FixedBalance(Decimal);

    #[async_trait]
    impl BalanceService for FixedBalance {
        async fn get_balance(&self, _address: &str) -> Result<Decimal> {
            Ok(self.0)
        }
    }

    fn position(condition_id: &str, size: Decimal, value: Decimal) -> Position {
        Position {
            proxy_wallet: String::new(),
            asset: format!("{}-yes", condition_id),
            condition_id: condition_id.to_string(),
            size,
            avg_price: dec!(0.5),
            initial_value: value,
            current_value: value,
            cur_price: dec!(0.5),
            title: None,
            slug: None,
            outcome: None,
        }
    }

    fn trade(id: &str, usdc_size: Decimal) -> TradeEvent {
        TradeEvent {
            id: id.to_string(),
            user_address: "0xuser".to_string(),
            condition_id: "0xcond".to_string(),
            asset: "0xcond-yes".to_string(),
            side: Some(Side::Buy),
            usdc_size,
            size: usdc_size * dec!(2),
            price: dec!(0.5),
            slug: Some("will-it-rain".to_string()),
            event_slug: None,
            title: None,
            outcome: None,
            timestamp: 1_704_067_200,
            filtered: false,
            executed_at: None,
        }
    }

    async fn setup(orders: MockOrderExecutor) -> (ExecutionPipeline, InMemoryTradeStore, AggregatedTrade) {
        let store = InMemoryTradeStore::new();
        let t1 = trade("t1", dec!(100));
        let t2 = trade("t2", dec!(60));
        store.insert(t1.clone()).await;
        store.insert(t2.clone()).await;

        let mut aggregate = AggregatedTrade::open(t1, Utc::now());
        aggregate.absorb(t2, Utc::now());

        let mut positions = HashMap::new();
        positions.insert(
            "0xme".to_string(),
            vec![position("0xother", dec!(10), dec!(5)), position("0xcond", dec!(20), dec!(10))],
        );
        positions.insert(
            "0xuser".to_string(),
            vec![position("0xcond", dec!(300), dec!(150)), position("0xelse", dec!(100), dec!(90))],
        );

        let deps = PipelineDeps {
            store: Arc::new(store.clone()),
            market_data: Arc::new(FixedMarketData(positions)),
            balances: Arc::new(FixedBalance(dec!(400))),
            orders: Arc::new(orders),
        };
        (
            ExecutionPipeline::new(deps, "0xme", Duration::from_secs(5)),
            store,
            aggregate,
        )
    }

    #[tokio::test]
    async fn test_execute_submits_synthetic_order_with_context() {
        let mut orders = MockOrderExecutor::new();
        orders
            .expect_submit()
            .withf(|request: &OrderRequest| {
                request.side == Side::Buy
                    && request.order.usdc_size == dec!(160)
                    && request.order.constituent_ids == vec!["t1", "t2"]
                    && request.own_balance == dec!(400)
                    && request.counterparty_balance == dec!(240)
                    && request.own_position.as_ref().map(|p| p.size) == Some(dec!(20))
                    && request.counterparty_position.as_ref().map(|p| p.size) == Some(dec!(300))
                    && request.counterparty_address == "0xuser"
            })
            .times(1)
            .returning(|_| {
                Ok(OrderOutcome::Submitted {
                    order_id: "order-1".to_string(),
                    side: Side::Buy,
                    amount: dec!(64),
                    price: dec!(0.5),
                })
            });

        let (pipeline, store, aggregate) = setup(orders).await;
        let outcome = pipeline.execute(&aggregate).await.unwrap();

        assert!(outcome.is_submitted());
        assert!(store.get("0xuser", "t1").await.unwrap().executed_at.is_some());
        assert!(store.get("0xuser", "t2").await.unwrap().executed_at.is_some());
    }

    /// Store whose batch mark always fails
    struct UnwritableStore(InMemoryTradeStore);

    #[async_trait]
    impl TradeStore for UnwritableStore {
        async fn find_unprocessed(&self, address: &str) -> Result<Vec<TradeEvent>> {
            self.0.find_unprocessed(address).await
        }

        async fn mark_filtered(&self, address: &str, trade_id: &str) -> Result<()> {
            self.0.mark_filtered(address, trade_id).await
        }

        async fn mark_executed(&self, _address: &str, _trade_ids: &[String], _at: chrono::DateTime<Utc>) -> Result<()> {
            Err(EngineError::Timeout("db".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_batch_mark_submits_nothing_and_marks_nothing() {
        let mut orders = MockOrderExecutor::new();
        orders.expect_submit().never();

        let (pipeline, store, aggregate) = setup(orders).await;
        let deps = PipelineDeps {
            store: Arc::new(UnwritableStore(store.clone())),
            ..pipeline.deps.clone()
        };
        let pipeline = ExecutionPipeline::new(deps, "0xme", Duration::from_secs(5));

        let result = pipeline.execute(&aggregate).await;

        assert!(matches!(result, Err(EngineError::Timeout(_))));
        let pending: Vec<String> = store
            .find_unprocessed("0xuser")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(pending, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_trades_marked_executed() {
        let mut orders = MockOrderExecutor::new();
        orders
            .expect_submit()
            .times(1)
            .returning(|_| Err(EngineError::OrderRejected("not enough liquidity".to_string())));

        let (pipeline, store, aggregate) = setup(orders).await;
        let result = pipeline.execute(&aggregate).await;

        assert!(matches!(result, Err(EngineError::OrderRejected(_))));
        assert!(store.find_unprocessed("0xuser").await.unwrap().is_empty());
    }
}
