//! Error types for dmsweep.

/// Failure to talk to the chat API at all.
///
/// Non-success HTTP statuses are not errors: they are variants of the
/// per-endpoint response enums in [`crate::api`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

/// Reasons a run is refused before any message is touched.
///
/// The `Display` text is what callers see in `ClearanceResult::message`.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid or expired token (HTTP {status}).")]
    InvalidToken { status: u16 },

    #[error("Token does not belong to user {expected} (resolved to {actual}).")]
    IdentityMismatch { expected: String, actual: String },

    #[error("Could not access the DM channel (HTTP {status}). Check that the channel ID is correct and that the channel still exists.")]
    ChannelUnavailable { status: u16 },

    #[error("Channel {channel_id} is not a direct-message channel (kind {kind}).")]
    NotDirectMessage { channel_id: String, kind: u32 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<ApiError> for ValidationError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Transport(msg) => ValidationError::Connection(msg),
            ApiError::Decode(msg) => ValidationError::Unexpected(msg),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
