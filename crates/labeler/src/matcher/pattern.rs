//! Compiled text patterns shared by the text-based matchers.

use regex::{Regex, RegexBuilder};

use crate::config::Pattern;
use crate::error::{LabelerError, Result};

/// The compiled patterns of one rule for one signal kind
#[derive(Debug, Clone, Default)]
pub struct TextPatterns {
    regexes: Vec<Regex>,
}

impl TextPatterns {
    pub fn compile(label: &str, kind: &'static str, patterns: &[Pattern]) -> Result<Self> {
        let regexes = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(&pattern.pattern)
                    .case_insensitive(pattern.case_insensitive)
                    .multi_line(pattern.multiline)
                    .build()
                    .map_err(|source| LabelerError::Pattern {
                        label: label.to_string(),
                        kind,
                        pattern: pattern.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { regexes })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }

    /// Whether any pattern matches `text`; absent text never matches
    #[must_use]
    pub fn matches(&self, text: Option<&str>) -> bool {
        text.is_some_and(|text| self.regexes.iter().any(|regex| regex.is_match(text)))
    }

    /// Whether any pattern matches any of `texts`
    #[must_use]
    pub fn matches_any(&self, texts: &[String]) -> bool {
        !self.is_empty() && texts.iter().any(|text| self.matches(Some(text)))
    }
}
