//! Read-only facts about the item and its change that matchers inspect.

use std::collections::BTreeSet;

/// Everything the matchers may look at, captured once per run.
///
/// Absent facts are `None` or empty: a plain issue has no branches, commits,
/// or files, and a fresh item may have no comments yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalBundle {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Bodies of every comment present at evaluation time
    pub comments: Vec<String>,
    /// Source (head) branch
    pub branch: Option<String>,
    /// Target (base) branch
    pub base_branch: Option<String>,
    /// Author login
    pub author: Option<String>,
    /// Full commit messages of the change
    pub commits: Vec<String>,
    /// Paths of changed files
    pub files: Vec<String>,
    /// Labels currently applied on the host platform
    pub current_labels: BTreeSet<String>,
}

impl SignalBundle {
    #[must_use]
    pub fn with_current_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current_labels = labels.into_iter().map(Into::into).collect();
        self
    }
}
