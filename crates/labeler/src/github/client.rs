//! # GitHub REST Client
//!
//! Label, status, and query operations against the GitHub REST API with
//! rate-limit tracking. Paginated listings fetch `per_page=100` pages until a
//! short page comes back.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Client as HttpClient, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::checks::StatusCheck;
use crate::error::GitHubError;
use crate::host::{LabelHost, SignalSource};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "labeler/0.3";
const PER_PAGE: usize = 100;
/// Upper bound on pages fetched per listing
const MAX_PAGES: usize = 50;

/// GitHub API client scoped to one repository
pub struct GitHubClient {
    http_client: HttpClient,
    base_url: Url,
    token: Option<String>,
    owner: String,
    repo: String,
    rate_limit: Mutex<RateLimit>,
}

#[derive(Debug, Clone, Copy)]
struct RateLimit {
    remaining: i64,
    reset: Option<Instant>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullCommit {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PullFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct FileContents {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubClient {
    /// Create a client for `owner/repo` against the public API
    pub fn new(
        token: Option<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, GitHubError> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: parse_base_url(DEFAULT_API_URL)?,
            token: token.filter(|t| !t.is_empty()),
            owner: owner.into(),
            repo: repo.into(),
            rate_limit: Mutex::new(RateLimit {
                remaining: 5000, // GitHub's default rate limit
                reset: None,
            }),
        })
    }

    /// Point the client at another API root (GitHub Enterprise, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, GitHubError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Read a text file from any repository through the contents API
    #[instrument(skip(self))]
    pub async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<String, GitHubError> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.endpoint(&segments)?;
        if let Some(reference) = reference {
            url.query_pairs_mut().append_pair("ref", reference);
        }

        let response = self.send(Method::GET, url, None).await?;
        let contents: FileContents = response.json().await?;

        if contents.encoding.as_deref().unwrap_or("base64") != "base64" {
            return Err(GitHubError::Decode(format!(
                "unsupported content encoding for {path}"
            )));
        }

        let packed: String = contents
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(packed)
            .map_err(|e| GitHubError::Decode(format!("{path}: {e}")))?;
        String::from_utf8(bytes).map_err(|e| GitHubError::Decode(format!("{path}: {e}")))
    }

    fn repo_endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut all = vec!["repos", self.owner.as_str(), self.repo.as_str()];
        all.extend_from_slice(segments);
        self.endpoint(&all)
    }

    /// Join percent-encoded path segments onto the API root
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GitHubError::Decode(format!("invalid API base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch every page of a list endpoint
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut url = self.repo_endpoint(segments)?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.send(Method::GET, url, None).await?;
            let batch: Vec<T> = response.json().await?;
            let count = batch.len();
            items.extend(batch);

            if count < PER_PAGE {
                break;
            }
            if page == MAX_PAGES {
                warn!(
                    "Stopped listing {} after {} pages",
                    segments.join("/"),
                    MAX_PAGES
                );
            }
        }

        Ok(items)
    }

    /// Send a request and turn non-success statuses into API errors
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, GitHubError> {
        let response = self.make_request(method, url, body).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<GitHubErrorBody>()
            .await
            .map_or_else(|_| status.to_string(), |e| e.message);
        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Make an HTTP request with rate limit tracking
    async fn make_request(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, GitHubError> {
        self.check_rate_limit()?;

        let mut request = self
            .http_client
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        self.update_rate_limit(&response);

        if response.status().as_u16() == 403 || response.status().as_u16() == 429 {
            let exhausted = header_value(&response, "x-ratelimit-remaining") == Some(0);
            if exhausted {
                if let Some(reset_in) = rate_limit_reset(&response) {
                    return Err(GitHubError::RateLimited { reset_in });
                }
            }
        }

        Ok(response)
    }

    /// Refuse to send while the quota is known to be exhausted
    fn check_rate_limit(&self) -> Result<(), GitHubError> {
        let state = *self
            .rate_limit
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if state.remaining > 0 {
            return Ok(());
        }
        match state.reset {
            Some(reset) if Instant::now() < reset => Err(GitHubError::RateLimited {
                reset_in: reset - Instant::now(),
            }),
            Some(_) => Ok(()),
            None => Err(GitHubError::RateLimited {
                reset_in: Duration::from_secs(60), // Conservative fallback
            }),
        }
    }

    /// Update rate limit tracking from response headers
    fn update_rate_limit(&self, response: &Response) {
        let remaining = header_value(response, "x-ratelimit-remaining");
        let reset = rate_limit_reset(response);
        if remaining.is_none() && reset.is_none() {
            return;
        }

        let mut state = self
            .rate_limit
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(remaining) = remaining {
            state.remaining = remaining;
        }
        if let Some(reset_in) = reset {
            state.reset = Some(Instant::now() + reset_in);
        }
    }
}

#[async_trait]
impl LabelHost for GitHubClient {
    #[instrument(skip(self), fields(number = %number, labels = ?labels))]
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GitHubError> {
        if labels.is_empty() {
            return Ok(());
        }

        let number_segment = number.to_string();
        let url = self.repo_endpoint(&["issues", number_segment.as_str(), "labels"])?;
        let body = serde_json::json!({ "labels": labels });
        self.send(Method::POST, url, Some(body)).await?;

        info!("Added {} labels to #{}", labels.len(), number);
        Ok(())
    }

    #[instrument(skip(self), fields(number = %number, label = %label))]
    async fn remove_label(&self, number: u64, label: &str) -> Result<(), GitHubError> {
        let number_segment = number.to_string();
        let url = self.repo_endpoint(&["issues", number_segment.as_str(), "labels", label])?;

        match self.send(Method::DELETE, url, None).await {
            Ok(_) => {
                debug!("Removed label '{}' from #{}", label, number);
                Ok(())
            }
            Err(GitHubError::Api { status: 404, .. }) => {
                // Label doesn't exist, which is fine for removal
                debug!("Label '{}' not found on #{} (already removed)", label, number);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, check), fields(sha = %sha, context = %check.context))]
    async fn create_status(&self, sha: &str, check: &StatusCheck) -> Result<(), GitHubError> {
        let url = self.repo_endpoint(&["statuses", sha])?;
        let mut body = serde_json::json!({
            "state": check.state.as_str(),
            "context": check.context,
        });
        if let Some(description) = &check.description {
            body["description"] = serde_json::Value::from(description.as_str());
        }
        if let Some(target_url) = &check.target_url {
            body["target_url"] = serde_json::Value::from(target_url.as_str());
        }

        self.send(Method::POST, url, Some(body)).await?;
        debug!("Posted status '{}' = {}", check.context, check.state);
        Ok(())
    }
}

#[async_trait]
impl SignalSource for GitHubClient {
    #[instrument(skip(self))]
    async fn comment_bodies(&self, number: u64) -> Result<Vec<String>, GitHubError> {
        let comments: Vec<IssueComment> = self
            .get_paginated(&["issues", number.to_string().as_str(), "comments"])
            .await?;
        Ok(comments.into_iter().filter_map(|c| c.body).collect())
    }

    #[instrument(skip(self))]
    async fn commit_messages(&self, number: u64) -> Result<Vec<String>, GitHubError> {
        let commits: Vec<PullCommit> = self
            .get_paginated(&["pulls", number.to_string().as_str(), "commits"])
            .await?;
        Ok(commits.into_iter().map(|c| c.commit.message).collect())
    }

    #[instrument(skip(self))]
    async fn changed_files(&self, number: u64) -> Result<Vec<String>, GitHubError> {
        let files: Vec<PullFile> = self
            .get_paginated(&["pulls", number.to_string().as_str(), "files"])
            .await?;
        debug!("Pull request #{} changes {} files", number, files.len());
        Ok(files.into_iter().map(|f| f.filename).collect())
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, GitHubError> {
    Url::parse(base_url).map_err(|e| GitHubError::Decode(format!("invalid API URL {base_url}: {e}")))
}

fn header_value(response: &Response, name: &str) -> Option<i64> {
    response
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
}

/// Time until the rate limit window resets
fn rate_limit_reset(response: &Response) -> Option<Duration> {
    header_value(response, "x-ratelimit-reset").map(|reset_timestamp| {
        let now = chrono::Utc::now().timestamp();
        #[allow(clippy::cast_sign_loss)]
        let seconds_until_reset = (reset_timestamp - now).max(0) as u64;
        Duration::from_secs(seconds_until_reset)
    })
}
