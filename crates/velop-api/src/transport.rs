// Shared transport configuration for building reqwest::Client instances.
//
// Velop nodes answer JNAP over plain HTTP on the LAN, so there is no TLS
// story here — only the request deadline and identification headers.

use std::time::Duration;

/// Transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request deadline. The node answers slowly while its radios are
    /// busy, so embedders surface this as a tunable.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("velop-api/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
