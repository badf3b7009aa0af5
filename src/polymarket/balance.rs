//! USDC balance lookup over Polygon JSON-RPC

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

use super::messages::{RpcRequest, RpcResponse};
use crate::common::errors::{EngineError, Result};
use crate::common::traits::BalanceService;

/// `balanceOf(address)` selector
const BALANCE_OF_SELECTOR: &str = "70a08231";

/// USDC has 6 decimals on Polygon
const USDC_DECIMALS: u32 = 6;

/// Reads an ERC-20 USDC balance with `eth_call`
#[derive(Debug, Clone)]
pub struct RpcBalanceClient {
    client: Client,
    rpc_url: String,
    token_contract: String,
}

impl RpcBalanceClient {
    pub fn new(rpc_url: &str, token_contract: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
            token_contract: token_contract.to_lowercase(),
        })
    }
}

/// ABI-encode `balanceOf(owner)`
pub fn encode_balance_of(owner: &str) -> Result<String> {
    // Selector followed by the address left-padded to one 32-byte word
    let stripped = owner.trim_start_matches("0x").to_lowercase();
    let bytes = hex::decode(&stripped)
        .map_err(|e| EngineError::Configuration(format!("Invalid wallet address {}: {}", owner, e)))?;
    if bytes.len() != 20 {
        return Err(EngineError::Configuration(format!(
            "Invalid wallet address {}: expected 20 bytes, got {}",
            owner,
            bytes.len()
        )));
    }
    Ok(format!("0x{}{:0>64}", BALANCE_OF_SELECTOR, stripped))
}

/// Decode a `uint256` USDC amount returned by `eth_call`
pub fn decode_usdc_amount(result: &str) -> Result<Decimal> {
    let stripped = result.trim_start_matches("0x");
    // Some nodes answer `0x` for an account that never held the token
    if stripped.is_empty() {
        return Ok(Decimal::ZERO);
    }
    // hex::decode needs an even number of digits
    let padded = if stripped.len() % 2 == 1 {
        format!("0{}", stripped)
    } else {
        stripped.to_string()
    };
    let bytes = hex::decode(&padded)
        .map_err(|e| EngineError::InvalidResponse(format!("Invalid eth_call result: {}", e)))?;

    // Anything above 16 bytes must be zero for the amount to fit an i128
    let split = bytes.len().saturating_sub(16);
    if bytes[..split].iter().any(|b| *b != 0) {
        return Err(EngineError::InvalidResponse("Balance exceeds supported range".to_string()));
    }
    let mut low = [0u8; 16];
    low[16 - (bytes.len() - split)..].copy_from_slice(&bytes[split..]);
    let raw = u128::from_be_bytes(low);
    let raw = i128::try_from(raw)
        .map_err(|_| EngineError::InvalidResponse("Balance exceeds supported range".to_string()))?;

    Decimal::try_from_i128_with_scale(raw, USDC_DECIMALS)
        .map_err(|e| EngineError::InvalidResponse(format!("Balance out of range: {}", e)))
}

#[async_trait]
impl BalanceService for RpcBalanceClient {
    #[instrument(skip(self))]
    async fn get_balance(&self, address: &str) -> Result<Decimal> {
        let request = RpcRequest::new(
            "eth_call",
            json!([
                { "to": self.token_contract, "data": encode_balance_of(address)? },
                "latest"
            ]),
        );

        let response = self.client.post(&self.rpc_url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::InvalidResponse(format!(
                "RPC returned status {}: {}",
                status, body
            )));
        }

        // JSON-RPC errors arrive with a 200 status
        let rpc: RpcResponse = response.json().await?;
        if let Some(err) = rpc.error {
            return Err(EngineError::InvalidResponse(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }
        let result = rpc
            .result
            .ok_or_else(|| EngineError::InvalidResponse("RPC response has no result".to_string()))?;

        let balance = decode_usdc_amount(&result)?;
        debug!(balance = %balance, "USDC balance fetched");
        Ok(balance)
    }
}
