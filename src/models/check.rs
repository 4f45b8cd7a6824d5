//! Outcome of one due-check for one site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::models::{ChangeSet, Severity};

/// Terminal status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Checked,
    Error,
    Skipped,
}

/// Error attached to a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AppError> for CheckError {
    fn from(error: &AppError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result of running (or skipping) the check pipeline for a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub url: String,
    pub status: CheckStatus,

    /// Whether regeneration ran and was accepted
    pub updated: bool,

    /// Present whenever the crawl succeeded
    pub changes: Option<ChangeSet>,
    pub severity: Option<Severity>,

    /// Human-readable explanation of the decision
    pub reason: Option<String>,
    pub error: Option<CheckError>,

    /// Pages returned by the crawl
    pub pages_count: Option<usize>,

    pub checked_at: DateTime<Utc>,

    /// Only set for skipped checks
    pub next_check_at: Option<DateTime<Utc>>,
}

impl CheckResult {
    /// A check that ran to a decision.
    pub fn checked(
        url: impl Into<String>,
        checked_at: DateTime<Utc>,
        updated: bool,
        changes: ChangeSet,
        severity: Severity,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: CheckStatus::Checked,
            updated,
            changes: Some(changes),
            severity: Some(severity),
            reason: Some(reason.into()),
            error: None,
            pages_count: None,
            checked_at,
            next_check_at: None,
        }
    }

    /// A check that ended in the errored state.
    pub fn failed(url: impl Into<String>, checked_at: DateTime<Utc>, error: &AppError) -> Self {
        Self {
            url: url.into(),
            status: CheckStatus::Error,
            updated: false,
            changes: None,
            severity: None,
            reason: None,
            error: Some(CheckError::from(error)),
            pages_count: None,
            checked_at,
            next_check_at: None,
        }
    }

    /// A site that was not due.
    pub fn skipped(
        url: impl Into<String>,
        now: DateTime<Utc>,
        next_check_at: Option<DateTime<Utc>>,
    ) -> Self {
        let reason = match next_check_at {
            Some(next) => format!("Next check scheduled for {}", next.to_rfc3339()),
            None => "Not due".to_string(),
        };
        Self {
            url: url.into(),
            status: CheckStatus::Skipped,
            updated: false,
            changes: None,
            severity: None,
            reason: Some(reason),
            error: None,
            pages_count: None,
            checked_at: now,
            next_check_at,
        }
    }

    /// Attach the crawl's page count.
    pub fn with_pages(mut self, pages_count: usize) -> Self {
        self.pages_count = Some(pages_count);
        self
    }

    /// Keep the diff on an errored result whose crawl succeeded.
    pub fn with_changes(mut self, changes: ChangeSet, severity: Severity) -> Self {
        self.changes = Some(changes);
        self.severity = Some(severity);
        self
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
