//! # Status Checks
//!
//! Commit statuses derived from the final label set, e.g. a required
//! "Release Label" check that only passes once a release label is present.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CheckSpec, LabelCondition};

/// Commit status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Success,
    Failure,
}

impl StatusState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status entry ready to be posted against the head revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub context: String,
    pub state: StatusState,
    pub description: Option<String>,
    pub target_url: Option<String>,
}

impl LabelCondition {
    /// Whether `labels` satisfies every non-empty condition
    #[must_use]
    pub fn is_satisfied_by(&self, labels: &BTreeSet<String>) -> bool {
        let any = self.any.is_empty() || self.any.iter().any(|l| labels.contains(l));
        let all = self.all.iter().all(|l| labels.contains(l));
        let none = !self.none.iter().any(|l| labels.contains(l));
        any && all && none
    }
}

/// Evaluate every configured check against the final labels, in config order
#[must_use]
pub fn evaluate(checks: &[CheckSpec], labels: &BTreeSet<String>) -> Vec<StatusCheck> {
    checks
        .iter()
        .map(|check| {
            let (state, description) = if check.labels.is_satisfied_by(labels) {
                (StatusState::Success, check.description.success.clone())
            } else {
                (StatusState::Failure, check.description.failure.clone())
            };
            StatusCheck {
                context: check.context.clone(),
                state,
                description,
                target_url: check.url.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckDescription;

    fn labels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn check(condition: LabelCondition) -> CheckSpec {
        CheckSpec {
            context: "Release Label".into(),
            url: Some("https://example.com/release".into()),
            description: CheckDescription {
                success: Some("Ready".into()),
                failure: Some("Missing label".into()),
            },
            labels: condition,
        }
    }

    #[test]
    fn test_any_condition() {
        let spec = check(LabelCondition {
            any: strings(&["feat", "fix"]),
            ..LabelCondition::default()
        });

        let results = evaluate(std::slice::from_ref(&spec), &labels(&["fix"]));
        assert_eq!(results[0].state, StatusState::Success);
        assert_eq!(results[0].description.as_deref(), Some("Ready"));
        assert_eq!(
            results[0].target_url.as_deref(),
            Some("https://example.com/release")
        );

        let results = evaluate(&[spec], &labels(&["docs"]));
        assert_eq!(results[0].state, StatusState::Failure);
        assert_eq!(results[0].description.as_deref(), Some("Missing label"));
    }

    #[test]
    fn test_all_and_none_conditions() {
        let spec = check(LabelCondition {
            all: strings(&["reviewed", "tested"]),
            none: strings(&["wip"]),
            ..LabelCondition::default()
        });

        let passing = labels(&["reviewed", "tested", "docs"]);
        assert_eq!(evaluate(std::slice::from_ref(&spec), &passing)[0].state, StatusState::Success);

        let partial = labels(&["reviewed"]);
        assert_eq!(evaluate(std::slice::from_ref(&spec), &partial)[0].state, StatusState::Failure);

        let blocked = labels(&["reviewed", "tested", "wip"]);
        assert_eq!(evaluate(&[spec], &blocked)[0].state, StatusState::Failure);
    }

    #[test]
    fn test_empty_condition_passes() {
        let results = evaluate(&[check(LabelCondition::default())], &labels(&[]));
        assert_eq!(results[0].state, StatusState::Success);
    }

    #[test]
    fn test_order_preserved() {
        let mut second = check(LabelCondition::default());
        second.context = "Second".into();
        let results = evaluate(&[check(LabelCondition::default()), second], &labels(&[]));
        let contexts: Vec<_> = results.iter().map(|c| c.context.as_str()).collect();
        assert_eq!(contexts, ["Release Label", "Second"]);
    }
}
