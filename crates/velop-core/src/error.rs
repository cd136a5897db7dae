// ── Core error types ──
//
// User-facing errors from velop-core. Consumers never see raw HTTP or
// JSON failures directly; the `From<velop_api::Error>` impl translates
// transport-layer errors into the cycle's failure taxonomy. Only
// fetch-stage failures surface to the scheduler — notification and
// reload failures are contained inside the cycle.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch-stage failures (retryable on the next scheduled poll) ──
    #[error(
        "timeout gathering data from the mesh after {timeout_secs}s — consider increasing the request timeout"
    )]
    FetchTimeout { timeout_secs: u64 },

    #[error("failed to gather data from the mesh: {message}")]
    FetchFailed { message: String },

    // ── Setup failures ───────────────────────────────────────────────
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("mesh not connected")]
    NotConnected,

    #[error("configuration error: {message}")]
    Config { message: String },

    // ── Contained failures (logged, never surfaced as cycle failure) ──
    #[error("reload failed: {message}")]
    ReloadFailed { message: String },

    #[error("identity update failed: {message}")]
    IdentityUpdateFailed { message: String },
}

impl CoreError {
    /// Whether the next scheduled cycle is expected to clear this error.
    ///
    /// The fixed polling cadence is the retry mechanism — there is no
    /// internal retry or backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchTimeout { .. } | Self::FetchFailed { .. })
    }

    /// Whether this was a timeout-class fetch failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::FetchTimeout { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<velop_api::Error> for CoreError {
    fn from(err: velop_api::Error) -> Self {
        match err {
            velop_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            velop_api::Error::Timeout { timeout_secs } => CoreError::FetchTimeout { timeout_secs },
            velop_api::Error::Transport(ref e) if e.is_timeout() => {
                CoreError::FetchTimeout { timeout_secs: 0 }
            }
            velop_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid node address: {e}"),
            },
            other => CoreError::FetchFailed {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_timeout_maps_to_fetch_timeout() {
        let err: CoreError = velop_api::Error::Timeout { timeout_secs: 10 }.into();
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[test]
    fn api_jnap_error_maps_to_fetch_failed() {
        let err: CoreError = velop_api::Error::Jnap {
            action: "http://linksys.com/jnap/devicelist/GetDevices3".into(),
            result: "_ErrorUnknownAction".into(),
        }
        .into();
        assert!(matches!(err, CoreError::FetchFailed { .. }));
        assert!(err.is_retryable());
        assert!(!err.is_timeout());
    }

    #[test]
    fn auth_failure_is_not_retryable() {
        let err: CoreError = velop_api::Error::Authentication {
            message: "admin password rejected".into(),
        }
        .into();
        assert!(!err.is_retryable());
    }
}
