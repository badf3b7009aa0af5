//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::common::errors::{EngineError, Result};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Aggregation and executor loop settings
    pub executor: ExecutorConfig,
    /// Polymarket endpoints and credentials
    #[serde(default)]
    pub polymarket: PolymarketConfig,
    /// Trade activity store
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Reject configurations the engine cannot start with
    pub fn validate(&self) -> Result<()> {
        self.executor.validate()?;
        for (name, value) in [
            ("polymarket.data_api_url", &self.polymarket.data_api_url),
            ("polymarket.clob_url", &self.polymarket.clob_url),
            ("polymarket.rpc_url", &self.polymarket.rpc_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                EngineError::Configuration(format!("{} is not a valid URL: {}", name, e))
            })?;
        }
        Ok(())
    }
}

/// Settings that drive aggregation and the executor loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Counterparty wallets whose trades are mirrored
    #[serde(deserialize_with = "deserialize_addresses")]
    pub user_addresses: Vec<String>,
    /// Our own (proxy) wallet
    pub proxy_wallet: String,
    /// Coalesce trades into windowed aggregates before executing
    #[serde(default = "default_aggregation_enabled")]
    pub aggregation_enabled: bool,
    /// Aggregation window in seconds
    #[serde(default = "default_aggregation_window")]
    pub aggregation_window_seconds: u64,
    /// Minimum aggregate notional (USDC) worth executing
    #[serde(default = "default_min_total")]
    pub aggregation_min_total_usd: Decimal,
    /// Delay between loop iterations in milliseconds
    #[serde(default = "default_loop_delay")]
    pub loop_delay_ms: u64,
    /// Idle time before a heartbeat is logged, in milliseconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.user_addresses.is_empty() {
            return Err(EngineError::Configuration(
                "USER_ADDRESSES is not defined or empty".to_string(),
            ));
        }
        if self.proxy_wallet.trim().is_empty() {
            return Err(EngineError::Configuration(
                "PROXY_WALLET is not defined".to_string(),
            ));
        }
        if self.aggregation_enabled && self.aggregation_window_seconds == 0 {
            return Err(EngineError::Configuration(
                "aggregation window must be at least one second".to_string(),
            ));
        }
        if self.aggregation_min_total_usd.is_sign_negative() {
            return Err(EngineError::Configuration(
                "aggregation minimum total cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn aggregation_window(&self) -> Duration {
        Duration::from_secs(self.aggregation_window_seconds)
    }

    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

fn default_aggregation_enabled() -> bool {
    true
}

fn default_aggregation_window() -> u64 {
    300
}

fn default_min_total() -> Decimal {
    dec!(1.0)
}

fn default_loop_delay() -> u64 {
    300
}

fn default_heartbeat_interval() -> u64 {
    60_000
}

/// Accepts either a list or a comma-separated string; lowercases and deduplicates
fn deserialize_addresses<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Addresses {
        List(Vec<String>),
        Csv(String),
    }

    let raw = match Addresses::deserialize(deserializer)? {
        Addresses::List(list) => list,
        Addresses::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    };
    Ok(normalize_addresses(raw))
}

pub(crate) fn normalize_addresses(raw: Vec<String>) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::with_capacity(raw.len());
    for address in raw {
        let address = address.trim().trim_matches('"').to_lowercase();
        if !address.is_empty() && !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    addresses
}

/// Polymarket platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolymarketConfig {
    /// API key for authenticated CLOB requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// API passphrase
    #[serde(default)]
    pub api_passphrase: Option<String>,
    /// Base URL for the CLOB REST API
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
    /// Base URL for the Data API (positions, activity)
    #[serde(default = "default_data_api_url")]
    pub data_api_url: String,
    /// Polygon JSON-RPC endpoint used for balance lookups
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// USDC.e contract on Polygon
    #[serde(default = "default_usdc_contract")]
    pub usdc_contract: String,
}

impl PolymarketConfig {
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret, &self.api_passphrase) {
            (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials::new(
                key.clone(),
                secret.clone(),
                passphrase.clone(),
            )),
            _ => None,
        }
    }
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            api_passphrase: None,
            clob_url: default_clob_url(),
            data_api_url: default_data_api_url(),
            rpc_url: default_rpc_url(),
            usdc_contract: default_usdc_contract(),
        }
    }
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_data_api_url() -> String {
    "https://data-api.polymarket.com".to_string()
}

fn default_rpc_url() -> String {
    "https://polygon-rpc.com".to_string()
}

fn default_usdc_contract() -> String {
    "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174".to_string()
}

/// Database configuration for the trade activity store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upper bound on every remote call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor_config() -> ExecutorConfig {
        ExecutorConfig {
            user_addresses: vec!["0xabc".to_string()],
            proxy_wallet: "0xme".to_string(),
            aggregation_enabled: true,
            aggregation_window_seconds: 30,
            aggregation_min_total_usd: dec!(1),
            loop_delay_ms: 300,
            heartbeat_interval_ms: 60_000,
        }
    }

    #[test]
    fn test_addresses_from_csv_string() {
        let json = r#"{"user_addresses": " 0xABC, 0xdef ,,0xabc", "proxy_wallet": "0xme"}"#;
        let config: ExecutorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.user_addresses, vec!["0xabc", "0xdef"]);
        assert!(config.aggregation_enabled);
        assert_eq!(config.aggregation_window(), Duration::from_secs(300));
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_addresses_from_list() {
        let json = r#"{"user_addresses": ["0xA", "0xB"], "proxy_wallet": "0xme"}"#;
        let config: ExecutorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.user_addresses, vec!["0xa", "0xb"]);
    }

    #[test]
    fn test_validate_rejects_empty_addresses() {
        let mut config = executor_config();
        config.user_addresses.clear();
        assert!(matches!(
            config.validate(),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_window_when_aggregating() {
        let mut config = executor_config();
        config.aggregation_window_seconds = 0;
        assert!(config.validate().is_err());

        config.aggregation_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_rejects_bad_url() {
        let mut polymarket = PolymarketConfig::default();
        polymarket.rpc_url = "not a url".to_string();
        let config = AppConfig {
            executor: executor_config(),
            polymarket,
            database: None,
            settings: AppSettings::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_require_all_parts() {
        let mut polymarket = PolymarketConfig::default();
        polymarket.api_key = Some("key".into());
        polymarket.api_secret = Some("secret".into());
        assert!(polymarket.credentials().is_none());

        polymarket.api_passphrase = Some("pass".into());
        assert!(polymarket.credentials().is_some());
    }
}
