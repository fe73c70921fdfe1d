//! # Label Reconciliation
//!
//! Merges the labels derived by the matchers with the labels currently on
//! the item. Only rules with `sync: true` may take a label away again; every
//! other label, once applied by a human or an earlier run, is kept.

use std::collections::BTreeSet;

use crate::config::Config;

/// Outcome of reconciling one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Labels justified by at least one matcher
    pub candidate: BTreeSet<String>,
    /// Labels the item should carry after this run
    pub final_labels: BTreeSet<String>,
    /// Final labels not applied yet
    pub additions: BTreeSet<String>,
    /// Sync labels applied now but no longer justified
    pub removals: BTreeSet<String>,
}

/// Sync labels that are currently applied and not justified by any matcher
#[must_use]
pub fn removal_set(
    candidate: &BTreeSet<String>,
    config: &Config,
    current: &BTreeSet<String>,
) -> BTreeSet<String> {
    config
        .labels
        .iter()
        .filter(|rule| {
            rule.sync && !candidate.contains(&rule.label) && current.contains(&rule.label)
        })
        .map(|rule| rule.label.clone())
        .collect()
}

/// `(candidate ∪ current) − removal_set`
#[must_use]
pub fn merge(
    candidate: &BTreeSet<String>,
    config: &Config,
    current: &BTreeSet<String>,
) -> BTreeSet<String> {
    let removals = removal_set(candidate, config, current);
    retain_unremoved(candidate, current, &removals)
}

fn retain_unremoved(
    candidate: &BTreeSet<String>,
    current: &BTreeSet<String>,
    removals: &BTreeSet<String>,
) -> BTreeSet<String> {
    candidate
        .union(current)
        .filter(|label| !removals.contains(*label))
        .cloned()
        .collect()
}

/// Compute the final set together with what has to be added and retracted
#[must_use]
pub fn reconcile(
    candidate: BTreeSet<String>,
    config: &Config,
    current: &BTreeSet<String>,
) -> Reconciliation {
    let removals = removal_set(&candidate, config, current);
    let final_labels = retain_unremoved(&candidate, current, &removals);
    let additions = final_labels.difference(current).cloned().collect();

    Reconciliation {
        candidate,
        final_labels,
        additions,
        removals,
    }
}
