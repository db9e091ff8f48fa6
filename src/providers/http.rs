/*!
 * Shared HTTP plumbing for the provider clients.
 *
 * Every backend performs a single attempt per call. Transport and status
 * failures are mapped onto `ProviderError` kinds here so that all providers
 * report them the same way.
 */

use std::time::Duration;

use log::{debug, error};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::errors::ProviderError;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build an HTTP client with the given request timeout
pub fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// Map a transport error to a provider error
pub fn map_transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(format!("{} request timed out: {}", provider, error))
    } else if error.is_decode() {
        ProviderError::Malformed(format!("{} response could not be decoded: {}", provider, error))
    } else {
        ProviderError::Network(format!("{} request failed: {}", provider, error))
    }
}

/// Map a non-success status code to a provider error
pub fn map_status_error(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let message = format!("{} API error {}: {}", provider, status.as_u16(), body);
    match status.as_u16() {
        401 | 403 => ProviderError::Auth(message),
        // DeepL reports an exhausted quota with 456
        429 | 456 => ProviderError::RateLimit(message),
        _ => ProviderError::Network(message),
    }
}

/// Check the status of a response and decode its JSON body
pub async fn decode_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("{} API error ({}): {}", provider, status, body);
        return Err(map_status_error(provider, status, &body));
    }

    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(provider, e))?;
    debug!("{} responded with {} bytes", provider, body.len());

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::Malformed(format!("Failed to parse {} response: {}", provider, e))
    })
}
