//! Configuration loader

use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{EngineError, Result};

/// Flat environment names understood for compatibility with existing
/// deployments, mapped onto their structured config keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("USER_ADDRESSES", "executor.user_addresses"),
    ("PROXY_WALLET", "executor.proxy_wallet"),
    ("TRADE_AGGREGATION_ENABLED", "executor.aggregation_enabled"),
    ("TRADE_AGGREGATION_WINDOW_SECONDS", "executor.aggregation_window_seconds"),
    ("TRADE_AGGREGATION_MIN_TOTAL_USD", "executor.aggregation_min_total_usd"),
    ("EXECUTOR_LOOP_DELAY_MS", "executor.loop_delay_ms"),
    ("HEARTBEAT_INTERVAL_MS", "executor.heartbeat_interval_ms"),
    ("CLOB_HTTP_URL", "polymarket.clob_url"),
    ("DATA_API_URL", "polymarket.data_api_url"),
    ("RPC_URL", "polymarket.rpc_url"),
    ("USDC_CONTRACT_ADDRESS", "polymarket.usdc_contract"),
    ("POLYMARKET_API_KEY", "polymarket.api_key"),
    ("POLYMARKET_API_SECRET", "polymarket.api_secret"),
    ("POLYMARKET_API_PASSPHRASE", "polymarket.api_passphrase"),
    ("DATABASE_URL", "database.url"),
];

/// Load configuration from file and environment variables, then validate it
///
/// Priority (highest to lowest):
/// 1. Flat legacy environment variables (`USER_ADDRESSES`, `PROXY_WALLET`, ...)
/// 2. Environment variables prefixed with `APP__` (e.g. `APP__EXECUTOR__LOOP_DELAY_MS`)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    builder = apply_legacy_env(builder, |name| std::env::var(name).ok())?;

    let config: AppConfig = builder
        .build()
        .map_err(|e| EngineError::Configuration(e.to_string()))?
        .try_deserialize()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

fn apply_legacy_env<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>>
where
    F: Fn(&str) -> Option<String>,
{
    for (env_name, key) in LEGACY_ENV_KEYS {
        let value = lookup(env_name).filter(|v| !v.trim().is_empty());
        builder = builder
            .set_override_option(*key, value)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn build_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let builder = apply_legacy_env(Config::builder(), |name| vars.get(name).cloned())?;
        let config: AppConfig = builder
            .build()
            .map_err(|e| EngineError::Configuration(e.to_string()))?
            .try_deserialize()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_legacy_env_names_map_to_executor_config() {
        let config = build_from(&[
            ("USER_ADDRESSES", "0xAAA,0xbbb"),
            ("PROXY_WALLET", "0xme"),
            ("TRADE_AGGREGATION_ENABLED", "false"),
            ("TRADE_AGGREGATION_WINDOW_SECONDS", "45"),
            ("TRADE_AGGREGATION_MIN_TOTAL_USD", "2.5"),
        ])
        .unwrap();

        assert_eq!(config.executor.user_addresses, vec!["0xaaa", "0xbbb"]);
        assert_eq!(config.executor.proxy_wallet, "0xme");
        assert!(!config.executor.aggregation_enabled);
        assert_eq!(config.executor.aggregation_window_seconds, 45);
        assert_eq!(config.executor.aggregation_min_total_usd, dec!(2.5));
        assert!(config.database.is_none());
    }

    #[test]
    fn test_missing_addresses_is_fatal() {
        let result = build_from(&[("USER_ADDRESSES", ""), ("PROXY_WALLET", "0xme")]);
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }
}
