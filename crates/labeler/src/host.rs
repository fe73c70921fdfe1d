//! Host platform seams: queries that build the signal bundle and the
//! mutations the driver issues. [`crate::github::GitHubClient`] implements
//! both; tests substitute mocks.

use async_trait::async_trait;

use crate::checks::StatusCheck;
use crate::error::GitHubError;

/// Label and status mutations on an issue or pull request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelHost: Send + Sync {
    /// Add labels in one batched call
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GitHubError>;

    /// Remove a single label
    async fn remove_label(&self, number: u64, label: &str) -> Result<(), GitHubError>;

    /// Post a commit status for `sha`
    async fn create_status(&self, sha: &str, check: &StatusCheck) -> Result<(), GitHubError>;
}

/// Item facts that are not part of the event payload
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Bodies of every comment on the item
    async fn comment_bodies(&self, number: u64) -> Result<Vec<String>, GitHubError>;

    /// Messages of every commit in the pull request
    async fn commit_messages(&self, number: u64) -> Result<Vec<String>, GitHubError>;

    /// Paths of every file changed by the pull request
    async fn changed_files(&self, number: u64) -> Result<Vec<String>, GitHubError>;
}
