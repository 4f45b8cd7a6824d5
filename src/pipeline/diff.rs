//! Diff calculation between page-set snapshots.
//!
//! Computes the difference between the stored snapshot and a fresh crawl to
//! identify added, removed and modified pages. Page identity is the
//! normalized URL; content equality is by fingerprint, so title edits or
//! markup churn alone never register as a modification.

use std::collections::BTreeSet;

use crate::models::{ChangeSet, ModifiedPage, Snapshot};

/// Calculator for computing diffs between snapshots.
#[derive(Debug, Clone, Default)]
pub struct DiffCalculator;

impl DiffCalculator {
    /// Create a new diff calculator.
    pub fn new() -> Self {
        Self
    }

    /// Calculate the diff between the previous snapshot (if any) and the current one.
    ///
    /// Without a previous snapshot every current page is reported as added.
    pub fn calculate(&self, previous: Option<&Snapshot>, current: &Snapshot) -> ChangeSet {
        let Some(previous) = previous else {
            return ChangeSet {
                added_pages: current.pages.keys().cloned().collect(),
                ..ChangeSet::default()
            };
        };

        // Added: in current but not in previous
        let added_pages: BTreeSet<String> = current
            .pages
            .keys()
            .filter(|url| !previous.pages.contains_key(*url))
            .cloned()
            .collect();

        // Removed: in previous but not in current
        let removed_pages: BTreeSet<String> = previous
            .pages
            .keys()
            .filter(|url| !current.pages.contains_key(*url))
            .cloned()
            .collect();

        // Modified: in both but fingerprint changed
        let mut modified_pages = Vec::new();
        let mut unmodified_count = 0;
        for (url, prev) in &previous.pages {
            let Some(curr) = current.pages.get(url) else {
                continue;
            };
            if prev.fingerprint == curr.fingerprint {
                unmodified_count += 1;
            } else {
                modified_pages.push(ModifiedPage {
                    url: url.clone(),
                    old_title: prev.title.clone(),
                    new_title: curr.title.clone(),
                });
            }
        }

        ChangeSet {
            added_pages,
            removed_pages,
            modified_pages,
            unmodified_count,
        }
    }
}

/// Convenience function to calculate diff.
pub fn calculate_diff(previous: Option<&Snapshot>, current: &Snapshot) -> ChangeSet {
    DiffCalculator::new().calculate(previous, current)
}
