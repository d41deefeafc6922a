//! Request types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::Deserialize;

use crate::bitbucket::PullRequestState;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPullRequestsRequest {
    #[schemars(description = "The Bitbucket project key, e.g. 'ABC'")]
    pub project: String,
    #[schemars(description = "The repository slug within the project")]
    #[serde(alias = "repo")]
    pub repository: String,
    #[schemars(
        description = "Which pull requests to list: OPEN (default), MERGED, DECLINED, or ALL"
    )]
    #[serde(default)]
    pub state: Option<PullRequestState>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPullRequestChangesRequest {
    #[schemars(description = "The Bitbucket project key, e.g. 'ABC'")]
    pub project: String,
    #[schemars(description = "The repository slug within the project")]
    #[serde(alias = "repo")]
    pub repository: String,
    #[schemars(description = "The numeric pull request id, as listed by get_prs")]
    pub pull_request_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPullRequestDiffRequest {
    #[schemars(description = "The Bitbucket project key, e.g. 'ABC'")]
    pub project: String,
    #[schemars(description = "The repository slug within the project")]
    #[serde(alias = "repo")]
    pub repository: String,
    #[schemars(description = "The numeric pull request id, as listed by get_prs")]
    pub pull_request_id: u64,
    #[schemars(
        description = "Path of the changed file relative to the repository root, as listed by get_pr_changes"
    )]
    pub path: String,
    #[schemars(description = "Lines of context around each hunk (Bitbucket default when omitted)")]
    #[serde(default)]
    pub context_lines: Option<u32>,
}
