//! Severity classification and the regeneration gate.
//!
//! The changed fraction is `(added + removed + modified) / max(1, |old|)`;
//! tier lower bounds are inclusive: major at 50%, moderate at 20%, minor at 5%.

use crate::models::{ChangeSet, Severity, Snapshot};

/// Lowest severity that warrants regenerating a steady-state site.
pub const REGENERATION_THRESHOLD: Severity = Severity::Minor;

/// Classify a change set relative to the size of the previous snapshot.
pub fn classify(previous: Option<&Snapshot>, changes: &ChangeSet) -> Severity {
    let denominator = previous.map_or(0, Snapshot::len).max(1);
    let changed = changes.change_count();

    // Integer comparisons keep the tier edges exact: changed / n >= p / 100.
    let at_least = |percent: usize| changed * 100 >= percent * denominator;

    if at_least(50) {
        Severity::Major
    } else if at_least(20) {
        Severity::Moderate
    } else if at_least(5) {
        Severity::Minor
    } else {
        Severity::Minimal
    }
}

/// Outcome of the deciding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub severity: Severity,

    /// No prior snapshot existed
    pub bootstrap: bool,

    pub regenerate: bool,
}

impl Decision {
    /// Human-readable explanation used as the check's reason.
    pub fn reason(&self) -> String {
        if self.bootstrap {
            "Initial setup for monitoring".to_string()
        } else if self.regenerate {
            format!(
                "Website structure changed ({} changes detected)",
                self.severity
            )
        } else {
            format!(
                "Changes below regeneration threshold ({} changes detected)",
                self.severity
            )
        }
    }
}

/// Classify and decide whether the check should regenerate artifacts.
///
/// The first check of a site always regenerates, whatever its severity.
pub fn decide(previous: Option<&Snapshot>, changes: &ChangeSet) -> Decision {
    let severity = classify(previous, changes);
    let bootstrap = previous.is_none();

    Decision {
        severity,
        bootstrap,
        regenerate: bootstrap || severity >= REGENERATION_THRESHOLD,
    }
}
