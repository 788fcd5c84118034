use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed (status {status:?}): {message}")]
    TokenRequestFailed { status: Option<u16>, message: String },

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] BridgeError),

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// HTTP status reported by the token endpoint, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::TokenRequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
