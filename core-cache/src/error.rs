use bridge_traits::error::BridgeError;
use bridge_traits::ValueKind;
use thiserror::Error;

/// Errors from the key-value store wrapper
#[derive(Error, Debug)]
pub enum CacheError {
    /// `verify_type` found a different value type under the key
    #[error("Cache key '{key}' holds a {actual}, expected a {expected}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// The backend rejected a command for the type stored under the key
    #[error("Cache key '{key}' holds a value of the wrong type")]
    WrongType { key: String },

    #[error("Cache backend error: {0}")]
    Backend(BridgeError),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Whether retrying the same command may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CacheError::Backend(e) if e.is_transient())
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            CacheError::TypeMismatch { .. } | CacheError::WrongType { .. }
        )
    }
}

impl From<BridgeError> for CacheError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::WrongType { key } => CacheError::WrongType { key },
            BridgeError::Serialization(msg) => CacheError::Serialization(msg),
            other => CacheError::Backend(other),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors from the entity cache service
#[derive(Error, Debug)]
pub enum CacheServiceError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Upstream failed and no cached copy was available
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] BridgeError),

    #[error("Invalid label identifier: '{0}'")]
    InvalidLabel(String),
}

pub type ServiceResult<T> = std::result::Result<T, CacheServiceError>;
