//! Change-detection pipeline.
//!
//! - `diff`: compare two snapshots into a `ChangeSet`
//! - `severity`: classify a change set and decide whether to regenerate
//! - `check`: run one site through crawl, diff, decide and regenerate

pub mod check;
pub mod diff;
pub mod severity;

pub use check::SiteChecker;
pub use diff::{DiffCalculator, calculate_diff};
pub use severity::{Decision, REGENERATION_THRESHOLD, classify, decide};
