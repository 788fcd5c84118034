//! Integration tests for logging initialisation

use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use tracing::Level;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(Level::DEBUG)
        .with_filter("core_runtime=debug");

    init_logging(config.clone()).expect("first initialisation succeeds");
    tracing::info!(label = "buildit-tech", "logging initialised");

    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Failed to initialize logging"));
}
