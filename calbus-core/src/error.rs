//! Error types for calbus.

use thiserror::Error;

/// Errors that can occur in calbus operations.
#[derive(Error, Debug)]
pub enum CalBusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication required: {0}")]
    Auth(String),

    /// A credential is missing or unreadable before anything was fetched.
    #[error("Missing credentials: {0}")]
    Credentials(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalBusError {
    /// Whether the source needs new or missing credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, CalBusError::Auth(_) | CalBusError::Credentials(_))
    }
}

/// Result type alias for calbus operations.
pub type CalBusResult<T> = Result<T, CalBusError>;
