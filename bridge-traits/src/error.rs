use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Key '{key}' holds a value of the wrong type")]
    WrongType { key: String },

    #[error("Upstream request failed (status {status:?}): {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether retrying the same call may succeed.
    ///
    /// Only network-level failures qualify. Wrong-type collisions,
    /// serialization failures and upstream 4xx responses are deterministic.
    pub fn is_transient(&self) -> bool {
        match self {
            BridgeError::Connection(_) | BridgeError::Timeout(_) | BridgeError::Io(_) => true,
            BridgeError::Upstream {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
