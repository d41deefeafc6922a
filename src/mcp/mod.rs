//! MCP server exposing Bitbucket pull request lookups as agent tools.
//!
//! The same [`McpServer`] is served two ways: over streamable HTTP, nested
//! into the REST router at [`crate::api::MCP_MOUNT`], and over stdio for
//! clients that launch the binary directly.

mod render;
mod types;

pub use render::*;
pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
    },
    ErrorData as McpError, ServerHandler, ServiceExt,
};

use crate::bitbucket::{BitbucketClient, BitbucketError, PullRequestState};
use crate::models::{file_path, required, ValidationError};

#[derive(Clone)]
pub struct McpServer {
    client: BitbucketClient,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(client: BitbucketClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    fn invalid_params(e: ValidationError) -> McpError {
        McpError::invalid_params(e.to_string(), None)
    }

    /// Upstream failures are reported to the agent as a failed tool call,
    /// not as a protocol error, so it can read the message and adjust.
    fn tool_error(context: &str, e: BitbucketError) -> CallToolResult {
        tracing::warn!("{}: {}", context, e);
        CallToolResult::error(vec![Content::text(format!("{}: {}", context, e))])
    }

    // ============================================================
    // Tool logic, shared with tests
    // ============================================================

    /// Pull requests of a repository rendered as text blocks.
    pub async fn pull_request_summary(
        &self,
        project: &str,
        repository: &str,
        state: PullRequestState,
    ) -> Result<String, BitbucketError> {
        let prs = self
            .client
            .list_pull_requests(project, repository, state)
            .await?;
        Ok(render_pull_requests(&prs, state))
    }

    /// Changed files of a pull request, one per line.
    pub async fn change_summary(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<String, BitbucketError> {
        let changes = self
            .client
            .list_changes(project, repository, pull_request_id)
            .await?;
        Ok(render_changes(&changes))
    }

    /// Raw diff text of one file.
    pub async fn file_diff(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: u64,
        path: &str,
        context_lines: Option<u32>,
    ) -> Result<String, BitbucketError> {
        let diff = self
            .client
            .get_diff(project, repository, pull_request_id, path, context_lines)
            .await?;
        if diff.trim().is_empty() {
            return Ok(format!("No differences found for {}.", path));
        }
        Ok(diff)
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "Get pull requests from a Bitbucket repository for a given project key and repository slug. Lists OPEN pull requests by default, newest first. Returns id, title, description, source and target branch for each. Use the id with get_pr_changes and get_pr_diff."
    )]
    async fn get_prs(
        &self,
        params: Parameters<GetPullRequestsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let project = required("project", Some(req.project)).map_err(Self::invalid_params)?;
        let repository =
            required("repository", Some(req.repository)).map_err(Self::invalid_params)?;
        let state = req.state.unwrap_or_default();

        match self.pull_request_summary(&project, &repository, state).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(Self::tool_error("Error fetching pull requests", e)),
        }
    }

    #[tool(
        description = "List the files changed by a Bitbucket pull request. Returns one line per file: the change type (ADD, MODIFY, DELETE, MOVE, COPY) followed by the path. Use a path with get_pr_diff to read its diff."
    )]
    async fn get_pr_changes(
        &self,
        params: Parameters<GetPullRequestChangesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let project = required("project", Some(req.project)).map_err(Self::invalid_params)?;
        let repository =
            required("repository", Some(req.repository)).map_err(Self::invalid_params)?;

        match self
            .change_summary(&project, &repository, req.pull_request_id)
            .await
        {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(Self::tool_error("Error fetching pull request changes", e)),
        }
    }

    #[tool(
        description = "Get the unified diff of a single file in a Bitbucket pull request. Pass the file path exactly as listed by get_pr_changes."
    )]
    async fn get_pr_diff(
        &self,
        params: Parameters<GetPullRequestDiffRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let project = required("project", Some(req.project)).map_err(Self::invalid_params)?;
        let repository =
            required("repository", Some(req.repository)).map_err(Self::invalid_params)?;
        let path = file_path(Some(req.path)).map_err(Self::invalid_params)?;

        match self
            .file_diff(
                &project,
                &repository,
                req.pull_request_id,
                &path,
                req.context_lines,
            )
            .await
        {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(Self::tool_error("Error fetching pull request diff", e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"Read-only access to pull requests on a Bitbucket Server instance.

WORKFLOW:
1. get_prs with a project key and repository slug to find pull requests under review
2. get_pr_changes with a pull request id to see which files it touches
3. get_pr_diff with the id and a file path to read that file's diff

Project keys are short upper-case identifiers (e.g. ABC). Repository slugs are
the lower-case names used in clone URLs."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

/// Build the streamable HTTP transport for nesting into an axum router.
pub fn streamable_http_service(
    client: BitbucketClient,
) -> StreamableHttpService<McpServer, LocalSessionManager> {
    StreamableHttpService::new(
        move || Ok(McpServer::new(client.clone())),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    )
}

pub async fn run_stdio_server(client: BitbucketClient) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(client);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
