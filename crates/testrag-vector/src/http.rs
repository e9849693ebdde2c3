//! Shared HTTP plumbing for provider clients

use reqwest::Client;
use std::time::Duration;
use testrag_core::{LlmConfig, RagError, Result};

/// Build a reqwest client with the timeouts from the LLM config
pub fn build_http_client(config: &LlmConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| RagError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

/// Map a transport error onto the error taxonomy
///
/// Connection failures and timeouts mean the provider could not be reached
/// at all; anything else is reported through `on_failure`.
pub fn map_request_error(
    error: reqwest::Error,
    context: &str,
    on_failure: fn(String) -> RagError,
) -> RagError {
    if error.is_connect() || error.is_timeout() {
        RagError::CollaboratorUnavailable(format!("{context}: {error}"))
    } else {
        on_failure(format!("{context}: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client_from_default_config() {
        assert!(build_http_client(&LlmConfig::default()).is_ok());
    }
}
