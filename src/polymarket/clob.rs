//! Live order placement on the Polymarket CLOB

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::auth::L2Headers;
use super::messages::{OrderPayload, OrderResponse, OrderType};
use crate::common::errors::{EngineError, Result};
use crate::common::traits::OrderExecutor;
use crate::common::types::Side;
use crate::config::types::ApiCredentials;
use crate::execution::order::{OrderOutcome, OrderRequest};
use crate::execution::sizing::{size_order, SizingDecision};

const ORDER_PATH: &str = "/order";

/// CLOB order client. Sizes each copy order and posts it as a fill-or-kill
/// order authenticated with L2 headers.
#[derive(Debug, Clone)]
pub struct ClobOrderClient {
    client: Client,
    base_url: String,
    maker: String,
    credentials: Option<ApiCredentials>,
}

impl ClobOrderClient {
    pub fn new(base_url: &str, maker: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            maker: maker.to_string(),
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build the order body. Returns `None` when the order rounds to nothing.
    pub fn build_payload(
        &self,
        credentials: &ApiCredentials,
        request: &OrderRequest,
        side: Side,
        amount: Decimal,
    ) -> Option<OrderPayload> {
        // The CLOB tick is one cent
        let price = request.order.price.round_dp(2);
        if price <= Decimal::ZERO {
            return None;
        }
        // Buys are sized in USDC, the order itself in shares
        let shares = match side {
            Side::Buy => (amount / price).round_dp(2),
            Side::Sell => amount.round_dp(2),
        };
        if shares <= Decimal::ZERO {
            return None;
        }

        Some(OrderPayload {
            token_id: request.order.asset.clone(),
            side,
            price: price.to_string(),
            size: shares.to_string(),
            order_type: OrderType::Fok,
            owner: credentials.api_key.clone(),
            maker: self.maker.clone(),
        })
    }

    async fn post_order(&self, credentials: &ApiCredentials, payload: &OrderPayload) -> Result<OrderResponse> {
        // Sign the exact body that is sent
        let body = serde_json::to_string(payload)?;
        let headers = L2Headers::sign(
            credentials,
            &self.maker,
            "POST",
            ORDER_PATH,
            &body,
            Utc::now().timestamp(),
        )?;

        let url = format!("{}{}", self.base_url, ORDER_PATH);
        debug!("Posting order to: {}", url);

        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body);
        let response = headers.apply_to_request(request).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EngineError::Authentication(format!(
                "CLOB rejected credentials with status {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::InvalidResponse(format!(
                "CLOB returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl OrderExecutor for ClobOrderClient {
    #[instrument(skip_all, fields(market = request.order.label(), side = %request.side))]
    async fn submit(&self, request: &OrderRequest) -> Result<OrderOutcome> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| EngineError::Authentication("CLOB API credentials not set".to_string()))?;

        // Sizing may decide there is nothing to place
        let (side, amount) = match size_order(request) {
            SizingDecision::Buy { usdc_amount } => (Side::Buy, usdc_amount),
            SizingDecision::Sell { shares } => (Side::Sell, shares),
            SizingDecision::Skip { reason } => return Ok(OrderOutcome::Skipped { reason }),
        };

        let payload = match self.build_payload(credentials, request, side, amount) {
            Some(payload) => payload,
            None => {
                return Ok(OrderOutcome::Skipped {
                    reason: format!("order of {} at {} rounds to zero", amount, request.order.price),
                })
            }
        };

        // A 200 can still carry a rejection
        let response = self.post_order(credentials, &payload).await?;
        if !response.success {
            let reason = response
                .error_msg
                .unwrap_or_else(|| "order not accepted".to_string());
            warn!(reason = %reason, "CLOB rejected order");
            return Err(EngineError::OrderRejected(reason));
        }

        let order_id = response.order_id.unwrap_or_default();
        info!(order_id = %order_id, size = %payload.size, price = %payload.price, "CLOB order accepted");

        Ok(OrderOutcome::Submitted {
            order_id,
            side,
            amount,
            price: request.order.price.round_dp(2),
        })
    }
}
