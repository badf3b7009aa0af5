//! L2 (API key) request signing for the Polymarket CLOB

use base64::{engine::general_purpose::URL_SAFE, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{EngineError, Result};
use crate::config::types::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over `timestamp + METHOD + path + body`, url-safe base64 in and out
///
/// # Arguments
/// * `secret` - API secret (url-safe base64)
/// * `timestamp` - Unix timestamp in seconds
/// * `method` - HTTP method, any case
/// * `request_path` - Endpoint path, e.g. `/order`
/// * `body` - Serialized request body (empty for GET)
pub fn sign_request(
    secret: &str,
    timestamp: i64,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String> {
    // Decode the url-safe secret
    let secret_bytes = URL_SAFE
        .decode(secret)
        .map_err(|e| EngineError::Authentication(format!("Failed to decode secret: {}", e)))?;

    // Message to sign: timestamp + METHOD + path + body
    let message = format!("{}{}{}{}", timestamp, method.to_uppercase(), request_path, body);

    // Compute the MAC
    let mut mac = HmacSha256::new_from_slice(&secret_bytes)
        .map_err(|e| EngineError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());

    // Encode with the same url-safe alphabet
    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}

/// Authentication headers for one CLOB request
#[derive(Debug, Clone)]
pub struct L2Headers {
    pub address: String,
    pub api_key: String,
    pub passphrase: String,
    pub signature: String,
    pub timestamp: i64,
}

impl L2Headers {
    /// Sign a request for `address` at the given unix timestamp
    pub fn sign(
        credentials: &ApiCredentials,
        address: &str,
        method: &str,
        request_path: &str,
        body: &str,
        timestamp: i64,
    ) -> Result<Self> {
        let signature = sign_request(&credentials.api_secret, timestamp, method, request_path, body)?;
        Ok(Self {
            address: address.to_string(),
            api_key: credentials.api_key.clone(),
            passphrase: credentials.passphrase.clone(),
            signature,
            timestamp,
        })
    }

    /// Add the `POLY_*` headers to a request
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("POLY_ADDRESS", &self.address)
            .header("POLY_API_KEY", &self.api_key)
            .header("POLY_PASSPHRASE", &self.passphrase)
            .header("POLY_SIGNATURE", &self.signature)
            .header("POLY_TIMESTAMP", self.timestamp.to_string())
    }
}
