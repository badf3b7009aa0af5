//! Positions lookup against the Polymarket Data API

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::messages::DataApiError;
use crate::common::errors::{EngineError, Result};
use crate::common::traits::MarketDataService;
use crate::common::types::Position;

/// Data API client
#[derive(Debug, Clone)]
pub struct DataApiClient {
    client: Client,
    base_url: Url,
}

impl DataApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let base_url = Url::parse(base_url)
            .map_err(|e| EngineError::Configuration(format!("Invalid Data API url {}: {}", base_url, e)))?;

        Ok(Self { client, base_url })
    }

    fn positions_url(&self, address: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("positions")
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        url.query_pairs_mut().append_pair("user", address);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataService for DataApiClient {
    #[instrument(skip(self))]
    async fn get_positions(&self, address: &str) -> Result<Vec<Position>> {
        let url = self.positions_url(address)?;
        debug!("Fetching positions from: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<DataApiError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(EngineError::InvalidResponse(format!(
                "Data API returned status {}: {}",
                status, detail
            )));
        }

        let positions: Vec<Position> = response.json().await?;
        debug!(count = positions.len(), "Positions fetched");
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_url_keeps_base_path() {
        let client = DataApiClient::new("https://data-api.polymarket.com/", Duration::from_secs(5)).unwrap();
        let url = client.positions_url("0xabc").unwrap();
        assert_eq!(url.as_str(), "https://data-api.polymarket.com/positions?user=0xabc");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = DataApiClient::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }
}
