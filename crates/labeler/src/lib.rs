//! # Labeler
//!
//! Assigns and retracts labels on GitHub issues and pull requests from
//! declarative rules, and posts commit statuses derived from the result.
//!
//! ## Architecture
//!
//! - [`matcher`]: eight independent matchers (title, body, comment, branch,
//!   base branch, commits, files, author) mapping signals to labels
//! - [`reconcile`]: merges derived labels with the current ones under
//!   per-rule `sync` semantics
//! - [`driver`]: runs the matchers, reconciles, and applies the outcome with
//!   a settle delay and best-effort removals
//! - [`checks`]: status checks computed from the final label set
//! - [`github`]: REST client and signal collection
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use labeler::{Config, EventKind, EventPayload, GitHubClient, Labeler, SignalCollector};
//! use labeler::matcher::CompiledRules;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(".github/labeler.yml")?;
//! let event = EventPayload::from_path(EventKind::PullRequest, "event.json")?;
//! let client = Arc::new(GitHubClient::new(None, "5dlabs", "cto")?);
//!
//! let rules = CompiledRules::compile(&config)?;
//! let signals = SignalCollector::new(&*client).collect(&event, &rules).await?;
//! let outcome = Labeler::new(client)
//!     .run(&config, &rules, &event.item, &signals)
//!     .await?;
//! println!("{:?}", outcome.final_labels);
//! outcome.removals.wait().await;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checks;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod github;
pub mod host;
pub mod matcher;
pub mod reconcile;
pub mod signal;

pub use checks::{StatusCheck, StatusState};
pub use config::{Config, ConfigSource, Rule};
pub use driver::{Labeler, PendingRemovals, RunOutcome, DEFAULT_SETTLE_DELAY};
pub use error::{GitHubError, LabelerError};
pub use event::{EventKind, EventPayload, ItemRef};
pub use github::{GitHubClient, SignalCollector};
pub use host::{LabelHost, SignalSource};
pub use signal::SignalBundle;
