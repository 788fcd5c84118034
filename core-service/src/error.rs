use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] core_cache::CacheServiceError),

    #[error("Attribution error: {0}")]
    Attribution(#[from] core_library::AttributionError),

    #[error("Import error: {0}")]
    Import(#[from] core_sync::ImportError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] bridge_traits::BridgeError),
}

impl CoreError {
    /// Whether the caller sent something unusable (400-style) rather than
    /// the core failing (500-style)
    pub fn is_client_error(&self) -> bool {
        use core_cache::CacheServiceError;
        use core_library::AttributionError;
        use core_sync::ImportError;

        matches!(
            self,
            CoreError::Cache(CacheServiceError::InvalidLabel(_))
                | CoreError::Attribution(AttributionError::InvalidLabel(_))
                | CoreError::Import(ImportError::InvalidLabel(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
