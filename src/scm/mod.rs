//! Source control and pull-request publishing
//!
//! Only explicitly listed files are ever committed, and a pull request is
//! created only when no open one exists for the same head/base pair.

mod git;
mod github;

pub use git::{authenticated_url, GitCli};
pub use github::GitHubClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PublishError {
    /// Push rejected or pull request refused because of a concurrent change
    #[error("Publish conflict: {0}")]
    Conflict(String),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hosting API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Publishing is not configured: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    #[serde(default)]
    pub title: String,
}

/// Parameters of a pull request to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    /// Source branch name
    pub head: String,
    pub base: String,
    pub body: String,
}

impl NewPullRequest {
    pub fn migration(head: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            title: "Migrate to Gradle".to_string(),
            head: head.into(),
            base: base.into(),
            body: "Automated migration.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "pull_request", rename_all = "lowercase")]
pub enum PullRequestOutcome {
    Created(PullRequest),
    Existing(PullRequest),
}

impl PullRequestOutcome {
    pub fn pull_request(&self) -> &PullRequest {
        match self {
            PullRequestOutcome::Created(pr) | PullRequestOutcome::Existing(pr) => pr,
        }
    }
}

#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clones the remote into `dest`, replacing anything already there
    async fn clone_repo(&self, dest: &Path) -> Result<(), PublishError>;

    /// Checks out `branch`: the remote one rebased onto `base` if it exists,
    /// otherwise a new branch from `base`
    async fn prepare_branch(&self, repo: &Path, branch: &str, base: &str) -> Result<(), PublishError>;

    /// Commits exactly `files` (relative to `repo`). Returns `false` when
    /// none of them changed.
    async fn commit_files(&self, repo: &Path, files: &[String], message: &str) -> Result<bool, PublishError>;

    async fn push(&self, repo: &Path, branch: &str) -> Result<(), PublishError>;
}

#[async_trait]
pub trait PullRequestHost: Send + Sync {
    async fn find_open(&self, head: &str, base: &str) -> Result<Option<PullRequest>, PublishError>;

    async fn create(&self, request: &NewPullRequest) -> Result<PullRequest, PublishError>;
}

/// Returns the open pull request for `request.head` -> `request.base`,
/// creating it if there is none
pub async fn ensure_pull_request(
    host: &dyn PullRequestHost,
    request: &NewPullRequest,
) -> Result<PullRequestOutcome, PublishError> {
    if let Some(existing) = host.find_open(&request.head, &request.base).await? {
        info!(url = %existing.html_url, "Pull request already exists");
        return Ok(PullRequestOutcome::Existing(existing));
    }

    let created = host.create(request).await?;
    info!(url = %created.html_url, "Pull request created");
    Ok(PullRequestOutcome::Created(created))
}
