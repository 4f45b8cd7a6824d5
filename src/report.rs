// src/report.rs

//! Wire shapes returned to RPC callers.
//!
//! Absent timestamps serialize as `null`; clients render them as "Never".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::models::{ChangeSet, CheckResult, CheckStatus, ModifiedPage, Severity, Site};
use crate::scheduler::SweepSummary;

/// `changes` object of a check report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangesReport {
    pub severity: Severity,
    pub new_pages: Vec<String>,
    pub removed_pages: Vec<String>,
    pub modified_pages: Vec<ModifiedPage>,
}

impl ChangesReport {
    pub fn new(changes: &ChangeSet, severity: Severity) -> Self {
        Self {
            severity,
            new_pages: changes.added_pages.iter().cloned().collect(),
            removed_pages: changes.removed_pages.iter().cloned().collect(),
            modified_pages: changes.modified_pages.clone(),
        }
    }
}

/// One site's check outcome as seen by callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckReport {
    pub url: String,
    pub status: CheckStatus,
    pub updated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangesReport>,

    /// Why the check did or did not regenerate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_reason: Option<String>,

    /// Error text, or the reason a site was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_count: Option<usize>,

    pub checked_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_check: Option<DateTime<Utc>>,
}

impl From<&CheckResult> for CheckReport {
    fn from(result: &CheckResult) -> Self {
        let changes = match (&result.changes, result.severity) {
            (Some(changes), Some(severity)) => Some(ChangesReport::new(changes, severity)),
            _ => None,
        };
        let (update_reason, message) = match result.status {
            CheckStatus::Checked => (result.reason.clone(), None),
            CheckStatus::Skipped => (None, result.reason.clone()),
            CheckStatus::Error => (None, result.error.as_ref().map(|e| e.message.clone())),
        };

        Self {
            url: result.url.clone(),
            status: result.status,
            updated: result.updated,
            changes,
            update_reason,
            message,
            error_kind: result.error_kind(),
            pages_count: result.pages_count,
            checked_at: result.checked_at,
            next_check: result.next_check_at,
        }
    }
}

/// Entry of `list_sites`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSummary {
    pub url: String,
    pub last_check: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
    pub check_interval_hours: f64,
    pub max_pages: usize,
}

impl From<&Site> for SiteSummary {
    fn from(site: &Site) -> Self {
        Self {
            url: site.url.clone(),
            last_check: site.last_check_at,
            last_update: site.last_update_at,
            check_interval_hours: site.check_interval_hours(),
            max_pages: site.max_pages,
        }
    }
}

/// Result of a periodic sweep, as returned by the cron trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepReport {
    pub status: String,
    pub sites_checked: usize,
    pub updates_made: usize,
    pub total_monitored: usize,
    pub results: Vec<CheckReport>,
}

impl SweepReport {
    pub fn new(results: &[CheckResult], total_monitored: usize) -> Self {
        let summary = SweepSummary::from_results(results);
        Self {
            status: "completed".to_string(),
            sites_checked: summary.checked,
            updates_made: summary.updated,
            total_monitored,
            results: results.iter().map(CheckReport::from).collect(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&AppError> for ErrorBody {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.to_string(),
            kind: error.kind(),
        }
    }
}
