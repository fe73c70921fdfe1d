//! # Application Driver
//!
//! Sequences one labeling run around the pure core:
//!
//! 1. fan out the matchers over the compiled rules and union their labels,
//! 2. reconcile against the labels currently on the item,
//! 3. schedule one detached, delayed removal per retracted sync label,
//! 4. post status checks and, after the settle delay, add the new labels.
//!
//! Additions are awaited and a failure is fatal. Removals are best-effort:
//! their failures are logged and never affect the run outcome, and the run
//! does not wait for them. [`PendingRemovals::wait`] lets callers (the binary
//! before exiting, tests) join them explicitly.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::checks::{self, StatusCheck};
use crate::config::Config;
use crate::error::{LabelerError, Result};
use crate::event::ItemRef;
use crate::host::LabelHost;
use crate::matcher::{self, CompiledRules};
use crate::reconcile::{self, Reconciliation};
use crate::signal::SignalBundle;

/// Pause before mutating labels so a just-created item is fully registered
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(15);

/// Runs labeling passes against a host platform
pub struct Labeler {
    host: Arc<dyn LabelHost>,
    settle_delay: Duration,
}

/// Result of one run
#[derive(Debug)]
pub struct RunOutcome {
    /// Labels the item carries after this run
    pub final_labels: BTreeSet<String>,
    /// Labels justified by the matchers
    pub candidate: BTreeSet<String>,
    /// Labels added by this run
    pub added: BTreeSet<String>,
    /// Sync labels that no longer apply
    pub removal_set: BTreeSet<String>,
    /// Status checks computed from the final labels
    pub checks: Vec<StatusCheck>,
    /// Detached removal tasks
    pub removals: PendingRemovals,
}

/// Handles to detached removal tasks
#[derive(Debug, Default)]
pub struct PendingRemovals {
    handles: Vec<JoinHandle<()>>,
}

impl PendingRemovals {
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every scheduled removal to finish.
    ///
    /// Removal failures were already logged; a panicking task is re-raised.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        }
    }
}

impl Labeler {
    #[must_use]
    pub fn new(host: Arc<dyn LabelHost>) -> Self {
        Self {
            host,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Evaluate the rules against the signals and apply the outcome
    #[instrument(skip_all, fields(number = item.number, event = %item.kind))]
    pub async fn run(
        &self,
        config: &Config,
        rules: &CompiledRules,
        item: &ItemRef,
        signals: &SignalBundle,
    ) -> Result<RunOutcome> {
        let Reconciliation {
            candidate,
            final_labels,
            additions,
            removals: removal_set,
        } = Self::determine(rules, config, signals).await;

        info!(
            candidate = ?candidate,
            current = ?signals.current_labels,
            removals = ?removal_set,
            final_labels = ?final_labels,
            "Labels determined"
        );

        let removals = if item.kind.allows_removal() {
            self.schedule_removals(item.number, &removal_set)
        } else {
            if !removal_set.is_empty() {
                debug!(
                    "Skipping removal of {:?}: '{}' events do not retract labels",
                    removal_set, item.kind
                );
            }
            PendingRemovals::default()
        };

        let checks = checks::evaluate(&config.checks, &final_labels);
        let (added, ()) = tokio::join!(
            self.apply_additions(item.number, &additions),
            self.post_checks(item, &checks)
        );
        added?;

        Ok(RunOutcome {
            final_labels,
            candidate,
            added: additions,
            removal_set,
            checks,
            removals,
        })
    }

    /// Matcher fan-out plus reconciliation, with no side effects
    pub async fn determine(
        rules: &CompiledRules,
        config: &Config,
        signals: &SignalBundle,
    ) -> Reconciliation {
        let candidate = matcher::evaluate_all(rules, signals).await;
        reconcile::reconcile(candidate, config, &signals.current_labels)
    }

    /// Wait out the settle delay, then add every new label in one call
    async fn apply_additions(&self, number: u64, additions: &BTreeSet<String>) -> Result<()> {
        if additions.is_empty() {
            debug!("No labels to add to #{}", number);
            return Ok(());
        }

        tokio::time::sleep(self.settle_delay).await;

        let labels: Vec<String> = additions.iter().cloned().collect();
        info!("Adding labels {:?} to #{}", labels, number);
        let result = self.host.add_labels(number, &labels).await;
        result.map_err(|source| LabelerError::Apply { labels, source })
    }

    /// Spawn one delayed, best-effort removal per label
    fn schedule_removals(&self, number: u64, labels: &BTreeSet<String>) -> PendingRemovals {
        let handles = labels
            .iter()
            .map(|label| {
                let host = Arc::clone(&self.host);
                let label = label.clone();
                let delay = self.settle_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    info!("Removing label '{}' from #{}", label, number);
                    if let Err(e) = host.remove_label(number, &label).await {
                        warn!(error = %e, "Ignoring failure to remove label '{}'", label);
                    }
                })
            })
            .collect();

        PendingRemovals { handles }
    }

    /// Post every status for the head revision; failures are only logged
    async fn post_checks(&self, item: &ItemRef, checks: &[StatusCheck]) {
        if checks.is_empty() {
            return;
        }
        let Some(sha) = item.head_sha.as_deref() else {
            debug!("No head revision for #{}, skipping status checks", item.number);
            return;
        };

        let results = join_all(checks.iter().map(|check| async move {
            (check, self.host.create_status(sha, check).await)
        }))
        .await;

        for (check, result) in results {
            if let Err(e) = result {
                warn!(error = %e, "Failed to post status check '{}'", check.context);
            }
        }
    }
}
