//! Error types for zapwallet.

/// Result type alias.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Main error type.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Query failed on every relay it was sent to.
    #[error("Query failed: {0}")]
    Query(String),

    /// WebSocket connection to a relay failed.
    #[error("Connection to {relay} failed: {reason}")]
    Connect { relay: String, reason: String },

    /// Relay answered OK false.
    #[error("{relay} rejected event: {reason}")]
    Rejected { relay: String, reason: String },

    /// Relay did not answer in time.
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// Relay connection is not open.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Discovery returned no usable wallet service.
    #[error("Failed to find a wallet service")]
    NoServiceFound,

    /// Wallet service has no relay to reach it on.
    #[error("Wallet service {0} advertises no relay")]
    NoRelay(String),

    /// Key could not be parsed.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// NIP-19 encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Event signing failed.
    #[error("Signing error: {0}")]
    Sign(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WalletError {
    /// Create a connection error.
    pub fn connect<R: Into<String>, S: ToString>(relay: R, reason: S) -> Self {
        Self::Connect { relay: relay.into(), reason: reason.to_string() }
    }

    /// Create a rejection error.
    pub fn rejected<R: Into<String>, S: ToString>(relay: R, reason: S) -> Self {
        Self::Rejected { relay: relay.into(), reason: reason.to_string() }
    }
}
