//! Common test utilities and fixtures

#![allow(dead_code)]

use polymarket_copy_executor::common::types::{Side, TradeEvent};
use rust_decimal::Decimal;

pub const TRADER: &str = "0x1111111111111111111111111111111111111111";
pub const PROXY_WALLET: &str = "0x2222222222222222222222222222222222222222";

/// A buy on the sample market by the followed trader
pub fn sample_trade(id: &str, usdc_size: Decimal, price: Decimal) -> TradeEvent {
    TradeEvent {
        id: id.to_string(),
        user_address: TRADER.to_string(),
        condition_id: "0x123456".to_string(),
        asset: "token_yes".to_string(),
        side: Some(Side::Buy),
        usdc_size,
        size: usdc_size / price,
        price,
        slug: Some("will-it-rain-tomorrow".to_string()),
        event_slug: Some("weather".to_string()),
        title: Some("Will it rain tomorrow?".to_string()),
        outcome: Some("Yes".to_string()),
        timestamp: 1_704_067_200,
        filtered: false,
        executed_at: None,
    }
}

/// Same as [`sample_trade`] on a different side of the book
pub fn sample_trade_on(id: &str, usdc_size: Decimal, price: Decimal, side: Side) -> TradeEvent {
    TradeEvent {
        side: Some(side),
        ..sample_trade(id, usdc_size, price)
    }
}

/// Sample API responses for testing
pub mod api_responses {
    /// Data API positions for the followed trader
    pub const POSITIONS: &str = r#"[
        {
            "proxyWallet": "0x1111111111111111111111111111111111111111",
            "asset": "token_yes",
            "conditionId": "0x123456",
            "size": 400,
            "avgPrice": 0.5,
            "initialValue": 200,
            "currentValue": 220,
            "curPrice": 0.55,
            "title": "Will it rain tomorrow?",
            "slug": "will-it-rain-tomorrow",
            "outcome": "Yes"
        },
        {
            "proxyWallet": "0x1111111111111111111111111111111111111111",
            "asset": "token_no",
            "conditionId": "0x654321",
            "size": 100,
            "avgPrice": 0.3,
            "initialValue": 30,
            "currentValue": 80,
            "curPrice": 0.8
        }
    ]"#;

    /// `eth_call` result for 250.5 USDC
    pub const BALANCE_OF: &str = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "result": "0x000000000000000000000000000000000000000000000000000000000eee53a0"
    }"#;

    pub const ORDER_ACCEPTED: &str = r#"{
        "success": true,
        "orderID": "0xorder123",
        "status": "matched"
    }"#;

    pub const ORDER_REJECTED: &str = r#"{
        "success": false,
        "errorMsg": "not enough balance / allowance"
    }"#;
}
