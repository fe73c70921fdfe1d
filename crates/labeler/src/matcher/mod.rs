//! # Pattern Matchers
//!
//! Eight independent matchers, one per signal kind, each answering which
//! configured labels apply given that signal. The set of kinds is closed and
//! enumerated by [`MatcherKind`]; rules are compiled once per run into
//! [`CompiledRules`] and shared read-only by every matcher.

pub mod files;
pub mod pattern;

use std::collections::BTreeSet;
use std::fmt;

use futures::future::join_all;
use tracing::debug;

use crate::config::{Config, Rule};
use crate::error::Result;
use crate::signal::SignalBundle;

pub use files::FilePatterns;
pub use pattern::TextPatterns;

/// The signal kind a matcher inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatcherKind {
    Title,
    Body,
    Comment,
    Branch,
    BaseBranch,
    Commits,
    Files,
    Author,
}

impl MatcherKind {
    pub const ALL: [Self; 8] = [
        Self::Title,
        Self::Body,
        Self::Comment,
        Self::Branch,
        Self::BaseBranch,
        Self::Commits,
        Self::Files,
        Self::Author,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Comment => "comment",
            Self::Branch => "branch",
            Self::BaseBranch => "baseBranch",
            Self::Commits => "commits",
            Self::Files => "files",
            Self::Author => "author",
        }
    }

    /// Labels of every rule whose patterns for this kind match the signals
    #[must_use]
    pub fn evaluate(self, rules: &CompiledRules, signals: &SignalBundle) -> BTreeSet<String> {
        let labels: BTreeSet<String> = rules
            .rules
            .iter()
            .filter(|rule| rule.matches(self, signals))
            .map(|rule| rule.label.clone())
            .collect();

        if !labels.is_empty() {
            debug!(matcher = self.as_str(), labels = ?labels, "Matcher produced labels");
        }
        labels
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule with all of its patterns compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub label: String,
    title: TextPatterns,
    body: TextPatterns,
    comment: TextPatterns,
    branch: TextPatterns,
    base_branch: TextPatterns,
    commits: TextPatterns,
    author: Vec<String>,
    files: FilePatterns,
}

impl CompiledRule {
    pub fn compile(rule: &Rule) -> Result<Self> {
        let label = rule.label.as_str();
        let spec = &rule.matcher;
        Ok(Self {
            label: rule.label.clone(),
            title: TextPatterns::compile(label, MatcherKind::Title.as_str(), &spec.title)?,
            body: TextPatterns::compile(label, MatcherKind::Body.as_str(), &spec.body)?,
            comment: TextPatterns::compile(label, MatcherKind::Comment.as_str(), &spec.comment)?,
            branch: TextPatterns::compile(label, MatcherKind::Branch.as_str(), &spec.branch)?,
            base_branch: TextPatterns::compile(
                label,
                MatcherKind::BaseBranch.as_str(),
                &spec.base_branch,
            )?,
            commits: TextPatterns::compile(label, MatcherKind::Commits.as_str(), &spec.commits)?,
            author: spec.author.clone(),
            files: FilePatterns::compile(label, &spec.files)?,
        })
    }

    /// Whether this rule carries any pattern for `kind`
    #[must_use]
    pub fn uses(&self, kind: MatcherKind) -> bool {
        match kind {
            MatcherKind::Title => !self.title.is_empty(),
            MatcherKind::Body => !self.body.is_empty(),
            MatcherKind::Comment => !self.comment.is_empty(),
            MatcherKind::Branch => !self.branch.is_empty(),
            MatcherKind::BaseBranch => !self.base_branch.is_empty(),
            MatcherKind::Commits => !self.commits.is_empty(),
            MatcherKind::Files => !self.files.is_empty(),
            MatcherKind::Author => !self.author.is_empty(),
        }
    }

    #[must_use]
    pub fn matches(&self, kind: MatcherKind, signals: &SignalBundle) -> bool {
        match kind {
            MatcherKind::Title => self.title.matches(signals.title.as_deref()),
            MatcherKind::Body => self.body.matches(signals.body.as_deref()),
            MatcherKind::Comment => self.comment.matches_any(&signals.comments),
            MatcherKind::Branch => self.branch.matches(signals.branch.as_deref()),
            MatcherKind::BaseBranch => self.base_branch.matches(signals.base_branch.as_deref()),
            MatcherKind::Commits => self.commits.matches_any(&signals.commits),
            MatcherKind::Files => self.files.matches_any(&signals.files),
            MatcherKind::Author => signals
                .author
                .as_deref()
                .is_some_and(|author| self.author.iter().any(|allowed| allowed == author)),
        }
    }
}

/// All rules of a configuration, compiled once per run
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

impl CompiledRules {
    /// Compile every rule; the first malformed pattern fails the run
    pub fn compile(config: &Config) -> Result<Self> {
        let rules = config
            .labels
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule needs signals of `kind`
    #[must_use]
    pub fn uses(&self, kind: MatcherKind) -> bool {
        self.rules.iter().any(|rule| rule.uses(kind))
    }
}

/// Run every matcher concurrently over the same signals and union the results.
///
/// With no rules nothing is evaluated and the candidate set is empty.
pub async fn evaluate_all(rules: &CompiledRules, signals: &SignalBundle) -> BTreeSet<String> {
    if rules.is_empty() {
        debug!("No rules configured, skipping matcher evaluation");
        return BTreeSet::new();
    }

    let results = join_all(
        MatcherKind::ALL
            .into_iter()
            .map(|kind| async move { kind.evaluate(rules, signals) }),
    )
    .await;

    results.into_iter().flatten().collect()
}
