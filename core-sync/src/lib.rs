//! # Catalog Import
//!
//! Imports a label's catalog from the upstream provider into the relational
//! store and keeps a log of every run.
//!
//! ## Components
//!
//! - **Import Log** (`import_log`): per-run state machine (`started` →
//!   `completed` | `failed`) and its SQLite repository
//! - **Credits** (`credits`): role inference for upstream artist credits
//! - **Orchestrator** (`orchestrator`): search, transactional persistence
//!   and cache refresh for one label

pub mod credits;
pub mod error;
pub mod import_log;
pub mod orchestrator;

pub use error::{ImportError, Result};
pub use import_log::{
    ImportLog, ImportLogId, ImportLogRepository, ImportStatus, SqliteImportLogRepository,
};
pub use orchestrator::{ImportOrchestrator, ImportResult, ImportStats};
