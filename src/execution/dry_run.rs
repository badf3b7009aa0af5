//! Order client that sizes and logs copy orders without placing them

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::order::{OrderOutcome, OrderRequest};
use super::sizing::{size_order, SizingDecision};
use crate::common::errors::Result;
use crate::common::traits::OrderExecutor;
use crate::common::types::Side;

/// Dry-run order client. Runs the same sizing as the live client.
#[derive(Debug, Clone, Default)]
pub struct DryRunOrderExecutor {
    placed: Arc<Mutex<Vec<OrderOutcome>>>,
}

impl DryRunOrderExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders "placed" so far, oldest first
    pub async fn placed(&self) -> Vec<OrderOutcome> {
        self.placed.lock().await.clone()
    }
}

#[async_trait]
impl OrderExecutor for DryRunOrderExecutor {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderOutcome> {
        let (side, amount) = match size_order(request) {
            SizingDecision::Buy { usdc_amount } => (Side::Buy, usdc_amount),
            SizingDecision::Sell { shares } => (Side::Sell, shares),
            SizingDecision::Skip { reason } => return Ok(OrderOutcome::Skipped { reason }),
        };

        let mut placed = self.placed.lock().await;
        let order_id = format!("dry_run_{}", placed.len() + 1);
        info!(
            order_id = %order_id,
            market = request.order.label(),
            side = %side,
            amount = %amount,
            price = %request.order.price,
            copied_from = %request.counterparty_address,
            "DRY-RUN order placed"
        );

        let outcome = OrderOutcome::Submitted {
            order_id,
            side,
            amount,
            price: request.order.price,
        };
        placed.push(outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::order::SyntheticOrder;
    use rust_decimal_macros::dec;

    fn request(own_balance: rust_decimal::Decimal) -> OrderRequest {
        OrderRequest {
            side: Side::Buy,
            own_position: None,
            counterparty_position: None,
            order: SyntheticOrder {
                id: "agg:0xa:3".to_string(),
                user_address: "0xuser".to_string(),
                condition_id: "0xcond".to_string(),
                asset: "token_yes".to_string(),
                side: Side::Buy,
                usdc_size: dec!(200),
                size: dec!(400),
                price: dec!(0.5),
                slug: Some("will-it-rain".to_string()),
                event_slug: None,
                title: None,
                outcome: None,
                timestamp: 0,
                constituent_ids: vec!["0xa".into(), "0xb".into(), "0xc".into()],
            },
            own_balance,
            counterparty_balance: dec!(800),
            counterparty_address: "0xuser".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dry_run_records_sized_orders() {
        let client = DryRunOrderExecutor::new();

        let outcome = client.submit(&request(dec!(100))).await.unwrap();
        assert_eq!(
            outcome,
            OrderOutcome::Submitted {
                order_id: "dry_run_1".to_string(),
                side: Side::Buy,
                amount: dec!(20),
                price: dec!(0.5),
            }
        );

        let skipped = client.submit(&request(dec!(0))).await.unwrap();
        assert!(!skipped.is_submitted());
        assert_eq!(client.placed().await.len(), 1);
    }
}
