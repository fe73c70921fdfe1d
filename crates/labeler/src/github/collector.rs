//! Builds the signal bundle from the event payload plus the queries the
//! configured rules actually need.

use tracing::debug;

use crate::error::GitHubError;
use crate::event::EventPayload;
use crate::host::SignalSource;
use crate::matcher::{CompiledRules, MatcherKind};
use crate::signal::SignalBundle;

pub struct SignalCollector<'a, S: SignalSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: SignalSource + ?Sized> SignalCollector<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Complete the payload signals with comments, commits, and files.
    ///
    /// Each listing is fetched concurrently and only when some rule matches on
    /// it; commits and files are only fetched for pull requests.
    pub async fn collect(
        &self,
        event: &EventPayload,
        rules: &CompiledRules,
    ) -> Result<SignalBundle, GitHubError> {
        let number = event.item.number;
        let is_pull_request = event.item.is_pull_request;

        let want_comments = rules.uses(MatcherKind::Comment);
        let want_commits = is_pull_request && rules.uses(MatcherKind::Commits);
        let want_files = is_pull_request && rules.uses(MatcherKind::Files);

        debug!(
            number,
            want_comments, want_commits, want_files, "Collecting item signals"
        );

        let comments = async {
            if want_comments {
                self.source.comment_bodies(number).await
            } else {
                Ok(Vec::new())
            }
        };
        let commits = async {
            if want_commits {
                self.source.commit_messages(number).await
            } else {
                Ok(Vec::new())
            }
        };
        let files = async {
            if want_files {
                self.source.changed_files(number).await
            } else {
                Ok(Vec::new())
            }
        };

        let (comments, commits, files) = tokio::try_join!(comments, commits, files)?;

        Ok(SignalBundle {
            comments,
            commits,
            files,
            ..event.signals.clone()
        })
    }
}
