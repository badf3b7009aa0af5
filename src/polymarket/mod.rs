//! Polymarket adapters: positions, USDC balance and order placement

pub mod auth;
pub mod balance;
pub mod clob;
pub mod data_api;
pub mod messages;

pub use balance::RpcBalanceClient;
pub use clob::ClobOrderClient;
pub use data_api::DataApiClient;
