use thiserror::Error;

/// Top-level error type for the `velop-api` crate.
///
/// Covers every failure mode of the JNAP surface: authentication,
/// transport, protocol-level result codes, and payload decoding.
/// `velop-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The admin password was rejected by the node.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── JNAP protocol ───────────────────────────────────────────────
    /// The node answered with a non-`OK` JNAP result code.
    #[error("JNAP error for {action}: {result}")]
    Jnap { action: String, result: String },

    /// A transaction response did not line up with the requested actions.
    #[error("Transaction response mismatch: expected {expected} responses, got {got}")]
    TransactionMismatch { expected: usize, got: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the admin password was
    /// rejected and new credentials are needed.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next scheduled poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the failure was timeout-class (the request never
    /// completed within the configured deadline).
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
