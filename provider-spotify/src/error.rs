//! Error types for the catalog API provider

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

/// Provider errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Token acquisition failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// API request returned a non-success status after retries
    #[error("Catalog API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::Api { status, message } => BridgeError::Upstream {
                status: Some(status),
                message,
            },
            SpotifyError::Auth(AuthError::Http(e)) => e,
            SpotifyError::Auth(e) => BridgeError::Upstream {
                status: e.status(),
                message: e.to_string(),
            },
            SpotifyError::Parse(msg) => BridgeError::Serialization(msg),
            SpotifyError::Bridge(e) => e,
        }
    }
}
