//! Change sets and severity tiers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A page present in both snapshots whose fingerprint differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedPage {
    pub url: String,
    pub old_title: String,
    pub new_title: String,
}

/// Structured diff between two snapshots.
///
/// The three collections are pairwise disjoint by URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSet {
    /// URLs present in the new snapshot only
    pub added_pages: BTreeSet<String>,

    /// URLs present in the old snapshot only
    pub removed_pages: BTreeSet<String>,

    /// Pages present in both with a different fingerprint, sorted by URL
    pub modified_pages: Vec<ModifiedPage>,

    /// Pages present in both with the same fingerprint
    pub unmodified_count: usize,
}

impl ChangeSet {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }

    /// Total number of added, removed and modified pages.
    pub fn change_count(&self) -> usize {
        self.added_pages.len() + self.removed_pages.len() + self.modified_pages.len()
    }
}

/// Magnitude of a change set relative to the prior snapshot size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minimal,
    Minor,
    Moderate,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minimal => "minimal",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
