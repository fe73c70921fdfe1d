//! # Triggering Event
//!
//! Decodes the CI event (name plus JSON payload) into the item being labeled
//! and the signals the payload already carries. The pull request object is
//! preferred over the issue object when both are present.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{LabelerError, Result};
use crate::signal::SignalBundle;

/// Kind of the event that triggered the run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PullRequest,
    PullRequestTarget,
    Issues,
    IssueComment,
    Other(String),
}

impl EventKind {
    /// Label-bearing kinds; only these may retract labels
    #[must_use]
    pub fn allows_removal(&self) -> bool {
        matches!(self, Self::PullRequest | Self::PullRequestTarget | Self::Issues)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PullRequest => "pull_request",
            Self::PullRequestTarget => "pull_request_target",
            Self::Issues => "issues",
            Self::IssueComment => "issue_comment",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name.trim() {
            "pull_request" => Self::PullRequest,
            "pull_request_target" => Self::PullRequestTarget,
            "issues" | "issue" => Self::Issues,
            "issue_comment" => Self::IssueComment,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the issue or pull request being labeled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub number: u64,
    pub kind: EventKind,
    /// Whether the item is a pull request (commits and files exist)
    pub is_pull_request: bool,
    /// Head revision, only known from a pull request payload
    pub head_sha: Option<String>,
}

/// Decoded event: the item plus the signals taken straight from the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayload {
    pub item: ItemRef,
    pub signals: SignalBundle,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    pull_request: Option<RawItem>,
    #[serde(default)]
    issue: Option<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    head: Option<RawRef>,
    #[serde(default)]
    base: Option<RawRef>,
    /// Present on issues that are actually pull requests
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    sha: Option<String>,
}

impl EventPayload {
    /// Decode an event payload document
    pub fn from_json(kind: EventKind, json: &str) -> Result<Self> {
        let raw: RawEvent = serde_json::from_str(json)?;

        let from_pull_request = raw.pull_request.is_some();
        let item = raw
            .pull_request
            .or(raw.issue)
            .ok_or(LabelerError::MissingItemNumber)?;
        let number = item.number.ok_or(LabelerError::MissingItemNumber)?;
        let is_pull_request = from_pull_request || item.pull_request.is_some();

        debug!(
            number,
            kind = %kind,
            is_pull_request,
            "Decoded event payload"
        );

        let head_sha = item.head.as_ref().and_then(|head| head.sha.clone());
        let signals = SignalBundle {
            title: item.title,
            body: item.body,
            branch: item.head.map(|head| head.git_ref),
            base_branch: item.base.map(|base| base.git_ref),
            author: item.user.map(|user| user.login),
            current_labels: item.labels.into_iter().map(|label| label.name).collect(),
            ..SignalBundle::default()
        };

        Ok(Self {
            item: ItemRef {
                number,
                kind,
                is_pull_request,
                head_sha,
            },
            signals,
        })
    }

    /// Read and decode the payload file the CI runner provides
    pub fn from_path(kind: EventKind, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LabelerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(kind, &json)
    }
}
