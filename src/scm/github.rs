use super::{NewPullRequest, PublishError, PullRequest, PullRequestHost};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("pom2gradle/", env!("CARGO_PKG_VERSION"));
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Pull requests through the GitHub REST API
pub struct GitHubClient {
    http: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish()
    }
}

impl GitHubClient {
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        })
    }

    fn pulls_url(&self) -> Result<Url, PublishError> {
        let raw = format!("{}/repos/{}/{}/pulls", self.api_base, self.owner, self.repo);
        Url::parse(&raw).map_err(|e| PublishError::Configuration(format!("invalid API URL {}: {}", raw, e)))
    }

    /// Listing query for open pull requests from `head` into `base`
    fn find_url(&self, head: &str, base: &str) -> Result<Url, PublishError> {
        let mut url = self.pulls_url()?;
        url.query_pairs_mut()
            .append_pair("head", &format!("{}:{}", self.owner, head))
            .append_pair("base", base)
            .append_pair("state", "open");
        Ok(url)
    }

    async fn api_error(response: reqwest::Response) -> PublishError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);

        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            PublishError::Conflict(message)
        } else {
            PublishError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn find_open(&self, head: &str, base: &str) -> Result<Option<PullRequest>, PublishError> {
        let url = self.find_url(head, base)?;
        debug!(%url, "Checking for an open pull request");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let open: Vec<PullRequest> = response.json().await?;
        Ok(open.into_iter().next())
    }

    async fn create(&self, request: &NewPullRequest) -> Result<PullRequest, PublishError> {
        info!(head = %request.head, base = %request.base, "Creating pull request");

        let response = self
            .http
            .post(self.pulls_url()?)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, GITHUB_MEDIA_TYPE)
            .json(request)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json().await?)
    }
}
