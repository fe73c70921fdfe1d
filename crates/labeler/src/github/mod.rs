//! GitHub host platform: REST client and signal collection.

pub mod client;
pub mod collector;

pub use client::{GitHubClient, DEFAULT_API_URL};
pub use collector::SignalCollector;

use crate::error::{LabelerError, Result};

/// Split `owner/repo`
pub fn parse_repo(repository: &str) -> Result<(&str, &str)> {
    match repository.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(LabelerError::Config(format!(
            "Invalid repository '{repository}', expected owner/repo"
        ))),
    }
}
