//! Error types for the labeler.

use std::time::Duration;

use thiserror::Error;

/// Fatal errors that abort a labeling run.
///
/// Removal and status-post failures are advisory and never reach this type;
/// they are logged where they happen.
#[derive(Debug, Error)]
pub enum LabelerError {
    /// Configuration is missing or semantically invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid YAML for the rule schema
    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A matcher pattern did not compile
    #[error("Invalid {kind} pattern `{pattern}` for label '{label}': {source}")]
    Pattern {
        label: String,
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The triggering event carries neither an issue nor a pull request number
    #[error("Could not get issue number from pull_request or issue in event payload")]
    MissingItemNumber,

    /// The event payload could not be decoded
    #[error("Invalid event payload: {0}")]
    Event(#[from] serde_json::Error),

    /// The batched label addition failed
    #[error("Failed to add labels {labels:?}: {source}")]
    Apply {
        labels: Vec<String>,
        #[source]
        source: GitHubError,
    },

    /// A host platform query needed to build the signal bundle failed
    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

impl LabelerError {
    /// Whether this error belongs to the configuration class, raised before
    /// any matcher runs.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Io { .. }
                | Self::Yaml(_)
                | Self::Pattern { .. }
                | Self::MissingItemNumber
                | Self::Event(_)
        )
    }
}

/// Errors raised by the GitHub REST client.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded, reset in {reset_in:?}")]
    RateLimited { reset_in: Duration },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GitHubError {
    /// HTTP status of an API error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T, E = LabelerError> = std::result::Result<T, E>;
