//! HTTP client for the Bitbucket Server REST API.
//!
//! Every call is a single authenticated GET against
//! `{base}/rest/api/1.0/projects/{project}/repos/{repository}/pull-requests...`.
//! Paged collections are followed to the last page.

mod types;

pub use types::*;

use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;

/// Page size requested from paged endpoints.
const PAGE_LIMIT: u32 = 100;

/// Upstream client errors.
#[derive(Debug, Error)]
pub enum BitbucketError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Bitbucket rejected the credentials ({0})")]
    Unauthorized(StatusCode),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bitbucket returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Unexpected response from Bitbucket: {0}")]
    Decode(String),

    #[error("Cannot build request URL from base {0}")]
    InvalidUrl(String),
}

impl BitbucketError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BitbucketError::Network(e) if e.is_timeout())
    }
}

/// Authenticated client for one Bitbucket Server instance.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    config: Config,
    client: Client,
}

impl BitbucketClient {
    pub fn new(config: &Config) -> Result<Self, BitbucketError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// List pull requests in `state`, newest first, across all pages.
    pub async fn list_pull_requests(
        &self,
        project: &str,
        repository: &str,
        state: PullRequestState,
    ) -> Result<Vec<PullRequest>, BitbucketError> {
        let url = self.pull_requests_url(project, repository, &[])?;
        self.get_all_pages(url, &[("state", state.as_str()), ("order", "NEWEST")])
            .await
    }

    /// List the files changed by a pull request.
    pub async fn list_changes(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<Vec<Change>, BitbucketError> {
        let id = pull_request_id.to_string();
        let url = self.pull_requests_url(project, repository, &[id.as_str(), "changes"])?;
        self.get_all_pages(url, &[]).await
    }

    /// Fetch the unified diff of one file in a pull request as plain text.
    pub async fn get_diff(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: u64,
        path: &str,
        context_lines: Option<u32>,
    ) -> Result<String, BitbucketError> {
        let id = pull_request_id.to_string();
        let mut segments = vec![id.as_str(), "diff"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.pull_requests_url(project, repository, &segments)?;

        let mut request = self.request(url).header(header::ACCEPT, "text/plain");
        if let Some(lines) = context_lines {
            request = request.query(&[("contextLines", lines)]);
        }

        let response = check_status(request.send().await?).await?;
        Ok(response.text().await?)
    }

    fn pull_requests_url(
        &self,
        project: &str,
        repository: &str,
        rest: &[&str],
    ) -> Result<Url, BitbucketError> {
        let mut url = self.config.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BitbucketError::InvalidUrl(self.config.base_url.to_string()))?;
            segments.pop_if_empty().extend([
                "rest",
                "api",
                "1.0",
                "projects",
                project,
                "repos",
                repository,
                "pull-requests",
            ]);
            segments.extend(rest);
        }
        Ok(url)
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        tracing::debug!("GET {}", url);
        self.client
            .get(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, BitbucketError> {
        let mut values = Vec::new();
        let mut start = 0u32;

        loop {
            let response = self
                .request(url.clone())
                .header(header::ACCEPT, "application/json")
                .query(query)
                .query(&[("start", start), ("limit", PAGE_LIMIT)])
                .send()
                .await?;
            let page: PagedResponse<T> = decode(check_status(response).await?).await?;
            let next_start = page.next_start();
            values.extend(page.values);

            match next_start {
                Some(next) if next > start => start = next,
                _ => break,
            }
        }

        Ok(values)
    }
}

/// Convert non-2xx responses into the matching error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BitbucketError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::warn!("Bitbucket returned {}: {}", status, message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(BitbucketError::Unauthorized(status))
        }
        StatusCode::NOT_FOUND => Err(BitbucketError::NotFound(message)),
        _ => Err(BitbucketError::Upstream { status, message }),
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BitbucketError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BitbucketError::Decode(e.to_string()))
}

/// Pull the human-readable message out of a Bitbucket Server error body.
///
/// Bitbucket Server reports errors as `{"errors": [{"message": "..."}]}`;
/// anything else is returned as-is.
fn error_message(body: &str) -> String {
    let messages: Vec<String> = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("errors").and_then(|e| e.as_array()).map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                    .map(str::to_string)
                    .collect()
            })
        })
        .unwrap_or_default();

    if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    }
}
