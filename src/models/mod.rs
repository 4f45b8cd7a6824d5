// src/models/mod.rs

//! Domain models for the monitoring engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod changes;
mod check;
mod config;
mod site;
mod snapshot;

// Re-export all public types
pub use changes::{ChangeSet, ModifiedPage, Severity};
pub use check::{CheckError, CheckResult, CheckStatus};
pub use config::{
    Config, CrawlerConfig, LoggingConfig, SchedulerConfig, ServerConfig, StorageConfig,
};
pub use site::{Site, site_key};
pub use snapshot::{CrawledPage, PageRecord, PageSet, Snapshot, fingerprint};
