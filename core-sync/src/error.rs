use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid label identifier: '{0}'")]
    InvalidLabel(String),

    /// Upstream search failed after the connector's own retries
    #[error("Import failed: {0}")]
    Upstream(BridgeError),

    /// The import transaction was rolled back
    #[error("Import failed: {0}")]
    Transaction(#[from] LibraryError),

    #[error("Import log {0} not found")]
    LogNotFound(String),

    #[error("Invalid import log ID: {0}")]
    InvalidLogId(String),

    #[error("Invalid import status: {0}")]
    InvalidStatus(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl ImportError {
    /// Text stored in the import log for a failed run.
    ///
    /// Upstream failures keep the provider's message as-is.
    pub fn log_message(&self) -> String {
        match self {
            ImportError::Upstream(BridgeError::Upstream { message, .. }) => message.clone(),
            ImportError::Upstream(other) => other.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
