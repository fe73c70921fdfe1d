//! Changed-file matching.
//!
//! Regex entries of a rule are folded into one `RegexSet` and globs into a
//! list of `WildMatch`, both compiled once per run, so each path costs a
//! single pass over the rule's patterns.

use regex::{Regex, RegexSet};
use wildmatch::WildMatch;

use crate::config::FilePattern;
use crate::error::{LabelerError, Result};

#[derive(Debug, Clone)]
pub struct FilePatterns {
    regexes: RegexSet,
    globs: Vec<WildMatch>,
}

impl FilePatterns {
    pub fn compile(label: &str, patterns: &[FilePattern]) -> Result<Self> {
        let mut regex_sources = Vec::new();
        let mut globs = Vec::new();

        for pattern in patterns {
            match pattern {
                FilePattern::Regex(source) | FilePattern::ExplicitRegex { regex: source } => {
                    // Compile individually first so the error names the offending entry
                    Regex::new(source).map_err(|e| pattern_error(label, source, e))?;
                    regex_sources.push(source.as_str());
                }
                FilePattern::Glob { glob } => globs.push(WildMatch::new(glob)),
            }
        }

        let regexes = RegexSet::new(&regex_sources)
            .map_err(|e| pattern_error(label, &regex_sources.join(" | "), e))?;

        Ok(Self { regexes, globs })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty() && self.globs.is_empty()
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regexes.is_match(path) || self.globs.iter().any(|glob| glob.matches(path))
    }

    /// Whether any of `paths` matches; stops at the first hit
    #[must_use]
    pub fn matches_any(&self, paths: &[String]) -> bool {
        !self.is_empty() && paths.iter().any(|path| self.matches(path))
    }
}

fn pattern_error(label: &str, pattern: &str, source: regex::Error) -> LabelerError {
    LabelerError::Pattern {
        label: label.to_string(),
        kind: "files",
        pattern: pattern.to_string(),
        source,
    }
}
