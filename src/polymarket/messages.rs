//! Wire types for the Polymarket Data API, CLOB order endpoint and Polygon RPC

use serde::{Deserialize, Serialize};

use crate::common::types::Side;

/// Order type accepted by the CLOB. Copy orders are always fill-or-kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Fok,
}

/// Order body posted to `/order`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub side: Side,
    /// Limit price as a decimal string
    pub price: String,
    /// Size in outcome shares as a decimal string
    pub size: String,
    pub order_type: OrderType,
    /// API key of the order owner
    pub owner: String,
    /// Maker wallet
    pub maker: String,
}

/// Response from `/order`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "orderID")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned by the Data API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataApiError {
    pub error: String,
}

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_payload_field_names() {
        let payload = OrderPayload {
            token_id: "token_yes".to_string(),
            side: Side::Buy,
            price: "0.52".to_string(),
            size: "38.46".to_string(),
            order_type: OrderType::Fok,
            owner: "key".to_string(),
            maker: "0xme".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["tokenID"], "token_yes");
        assert_eq!(json["side"], "BUY");
        assert_eq!(json["orderType"], "FOK");
    }

    #[test]
    fn test_order_response_parsing() {
        let ok: OrderResponse =
            serde_json::from_str(r#"{"success": true, "orderID": "0xorder", "status": "matched"}"#)
                .unwrap();
        assert!(ok.success);
        assert_eq!(ok.order_id.as_deref(), Some("0xorder"));

        let rejected: OrderResponse =
            serde_json::from_str(r#"{"success": false, "errorMsg": "not enough balance"}"#).unwrap();
        assert!(!rejected.success);
        assert_eq!(rejected.error_msg.as_deref(), Some("not enough balance"));
    }
}
