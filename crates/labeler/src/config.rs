//! # Rule Configuration
//!
//! Declarative labeling rules and status-check definitions, loaded once per
//! run from a YAML file in the repository or from another repository.
//!
//! ```yaml
//! version: v1
//! labels:
//!   - label: docs
//!     sync: true
//!     matcher:
//!       body: "(?i)docs"
//!       files: ["docs/.*", { glob: "*.md" }]
//! checks:
//!   - context: "Release Label"
//!     description:
//!       success: "Ready for review & merge."
//!       failure: "Missing release label."
//!     labels:
//!       any: [feature, fix, chore]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{LabelerError, Result};
use crate::github::GitHubClient;

/// Full labeler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Schema version marker, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Labeling rules; duplicate label names are evaluated independently
    #[serde(default, deserialize_with = "nullable_list")]
    pub labels: Vec<Rule>,

    /// Commit status checks derived from the final label set
    #[serde(default, deserialize_with = "nullable_list")]
    pub checks: Vec<CheckSpec>,
}

/// One labeling policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Label applied when any matcher of this rule holds
    pub label: String,

    /// Machine-managed label: removed again once no matcher justifies it
    #[serde(default)]
    pub sync: bool,

    #[serde(default)]
    pub matcher: MatcherSpec,
}

/// Per-signal pattern lists of a rule. Empty lists contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherSpec {
    #[serde(default, deserialize_with = "one_or_many")]
    pub title: Vec<Pattern>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub body: Vec<Pattern>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub comment: Vec<Pattern>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub branch: Vec<Pattern>,

    #[serde(default, alias = "base-branch", deserialize_with = "one_or_many")]
    pub base_branch: Vec<Pattern>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub commits: Vec<Pattern>,

    /// Author logins, compared exactly
    #[serde(default, deserialize_with = "one_or_many")]
    pub author: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub files: Vec<FilePattern>,
}

/// A text pattern with its matching flags.
///
/// Accepts either a bare regex string or a mapping with explicit flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternRepr", rename_all = "camelCase")]
pub struct Pattern {
    pub pattern: String,
    pub case_insensitive: bool,
    pub multiline: bool,
}

impl Pattern {
    /// Case-sensitive, single-line pattern
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive: false,
            multiline: false,
        }
    }

    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    #[must_use]
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }
}

impl From<&str> for Pattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Plain(String),
    Detailed {
        pattern: String,
        #[serde(default, rename = "caseInsensitive", alias = "case-insensitive")]
        case_insensitive: bool,
        #[serde(default)]
        multiline: bool,
    },
}

impl From<PatternRepr> for Pattern {
    fn from(repr: PatternRepr) -> Self {
        match repr {
            PatternRepr::Plain(pattern) => Self::new(pattern),
            PatternRepr::Detailed {
                pattern,
                case_insensitive,
                multiline,
            } => Self {
                pattern,
                case_insensitive,
                multiline,
            },
        }
    }
}

/// A changed-file pattern: a regex by default, or a shell glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilePattern {
    Regex(String),
    Glob { glob: String },
    ExplicitRegex { regex: String },
}

impl From<&str> for FilePattern {
    fn from(pattern: &str) -> Self {
        Self::Regex(pattern.to_string())
    }
}

/// A commit status derived from the presence of labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Status context, e.g. "Release Label"
    pub context: String,

    /// Optional target URL attached to the status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub description: CheckDescription,

    #[serde(default)]
    pub labels: LabelCondition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Label presence conditions; an empty list is always satisfied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCondition {
    #[serde(default, deserialize_with = "one_or_many")]
    pub any: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub all: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub none: Vec<String>,
}

impl Config {
    /// Parse and validate a YAML configuration document
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a local file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LabelerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&source)
    }

    /// Check structural constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        for (index, rule) in self.labels.iter().enumerate() {
            if rule.label.trim().is_empty() {
                return Err(LabelerError::Config(format!(
                    "labels[{index}] has an empty label name"
                )));
            }
        }
        for (index, check) in self.checks.iter().enumerate() {
            if check.context.trim().is_empty() {
                return Err(LabelerError::Config(format!(
                    "checks[{index}] has an empty context"
                )));
            }
        }
        Ok(())
    }
}

/// Where the configuration lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// File in the checked-out workspace
    Local(PathBuf),
    /// File in a (possibly different) repository, read through the contents API
    Remote {
        owner: String,
        repo: String,
        path: String,
        reference: Option<String>,
    },
}

impl ConfigSource {
    /// Pick the source for `config_path`: local unless `config_repo` names a
    /// repository other than the current one.
    pub fn resolve(
        config_path: &str,
        config_repo: Option<&str>,
        current_repo: &str,
    ) -> Result<Self> {
        match config_repo.map(str::trim).filter(|r| !r.is_empty()) {
            Some(repo) if repo != current_repo => {
                let (owner, repo) = crate::github::parse_repo(repo)?;
                Ok(Self::Remote {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    path: config_path.to_string(),
                    reference: None,
                })
            }
            _ => Ok(Self::Local(PathBuf::from(config_path))),
        }
    }

    /// Load and parse the configuration
    pub async fn load(&self, client: &GitHubClient) -> Result<Config> {
        match self {
            Self::Local(path) => {
                debug!(path = %path.display(), "Loading local configuration");
                Config::load(path)
            }
            Self::Remote {
                owner,
                repo,
                path,
                reference,
            } => {
                info!("Loading configuration {} from {}/{}", path, owner, repo);
                let source = client
                    .get_file_contents(owner, repo, path, reference.as_deref())
                    .await
                    .map_err(|e| {
                        LabelerError::Config(format!(
                            "failed to fetch {path} from {owner}/{repo}: {e}"
                        ))
                    })?;
                Config::from_yaml(&source)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Accept a scalar, a list, or null for list-valued fields
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(
        match Option::<OneOrMany<T>>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(OneOrMany::One(value)) => vec![value],
            Some(OneOrMany::Many(values)) => values,
        },
    )
}

fn nullable_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
version: v1
labels:
  - label: feat
    sync: true
    matcher:
      title: "^feat:.*"
      body: ["/feat", { pattern: "feature", caseInsensitive: true }]
      baseBranch: "^main$"
      author: github-actions
      files:
        - "src/.*"
        - glob: "*.rs"
        - regex: "^build\\.rs$"
  - label: docs
    matcher:
      base-branch: ["^docs$"]
      comment:
checks:
  - context: "Release Label"
    url: "https://example.com"
    description:
      success: "Ready"
      failure: "Missing label"
    labels:
      any: [feat, fix]
      none: wip
"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml(FULL).unwrap();
        assert_eq!(config.version.as_deref(), Some("v1"));
        assert_eq!(config.labels.len(), 2);

        let feat = &config.labels[0];
        assert!(feat.sync);
        assert_eq!(feat.matcher.title, vec![Pattern::new("^feat:.*")]);
        assert_eq!(
            feat.matcher.body,
            vec![
                Pattern::new("/feat"),
                Pattern::new("feature").case_insensitive()
            ]
        );
        assert_eq!(feat.matcher.base_branch, vec![Pattern::new("^main$")]);
        assert_eq!(feat.matcher.author, vec!["github-actions".to_string()]);
        assert_eq!(
            feat.matcher.files,
            vec![
                FilePattern::Regex("src/.*".into()),
                FilePattern::Glob {
                    glob: "*.rs".into()
                },
                FilePattern::ExplicitRegex {
                    regex: "^build\\.rs$".into()
                },
            ]
        );

        let docs = &config.labels[1];
        assert!(!docs.sync);
        assert_eq!(docs.matcher.base_branch, vec![Pattern::new("^docs$")]);
        assert!(docs.matcher.comment.is_empty());

        let check = &config.checks[0];
        assert_eq!(check.labels.any, vec!["feat", "fix"]);
        assert_eq!(check.labels.none, vec!["wip"]);
        assert!(check.labels.all.is_empty());
    }

    #[test]
    fn test_empty_document_has_no_rules() {
        let config = Config::from_yaml("labels:\n").unwrap();
        assert!(config.labels.is_empty());
        assert!(config.checks.is_empty());
    }

    #[test]
    fn test_empty_label_rejected() {
        let err = Config::from_yaml("labels:\n  - label: \"\"\n").unwrap_err();
        assert!(matches!(err, LabelerError::Config(_)));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = Config::from_yaml("labels: [label: {").unwrap_err();
        assert!(matches!(err, LabelerError::Yaml(_)));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load("/nonexistent/labeler.yml").unwrap_err();
        assert!(matches!(err, LabelerError::Io { .. }));
    }

    #[test]
    fn test_resolve_source() {
        assert_eq!(
            ConfigSource::resolve(".github/labeler.yml", None, "acme/app").unwrap(),
            ConfigSource::Local(PathBuf::from(".github/labeler.yml"))
        );
        assert_eq!(
            ConfigSource::resolve(".github/labeler.yml", Some("acme/app"), "acme/app").unwrap(),
            ConfigSource::Local(PathBuf::from(".github/labeler.yml"))
        );
        assert_eq!(
            ConfigSource::resolve("labeler.yml", Some("acme/shared"), "acme/app").unwrap(),
            ConfigSource::Remote {
                owner: "acme".into(),
                repo: "shared".into(),
                path: "labeler.yml".into(),
                reference: None,
            }
        );
        assert!(ConfigSource::resolve("labeler.yml", Some("no-slash"), "acme/app").is_err());
    }
}
