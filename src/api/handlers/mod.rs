use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::bitbucket::{BitbucketClient, BitbucketError, Change, PullRequest};
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Reject a request whose parameters failed validation.
/// No upstream call has been made at this point.
fn bad_request(e: ValidationError) -> (StatusCode, String) {
    tracing::warn!("Rejected request: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Map an upstream failure to a gateway-style response.
///
/// A missing project, repository or pull request is passed through as 404.
/// Timeouts become 504; everything else Bitbucket-side is a 502 carrying
/// the upstream message.
fn upstream_error(e: BitbucketError) -> (StatusCode, String) {
    let status = match &e {
        BitbucketError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };

    if status == StatusCode::NOT_FOUND {
        tracing::warn!("Upstream lookup failed: {}", e);
    } else {
        tracing::error!("Upstream error: {}", e);
    }
    (status, e.to_string())
}

// ============================================================
// Service
// ============================================================

pub async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Bitbucket pull request proxy",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Pull Requests
// ============================================================

pub async fn list_pull_requests(
    State(client): State<BitbucketClient>,
    Query(query): Query<PullRequestQuery>,
) -> Result<Json<Vec<PullRequest>>, (StatusCode, String)> {
    let params = query.validate().map_err(bad_request)?;

    client
        .list_pull_requests(&params.project, &params.repository, params.state)
        .await
        .map(Json)
        .map_err(upstream_error)
}

pub async fn list_changes(
    State(client): State<BitbucketClient>,
    Query(query): Query<PullRequestChangeQuery>,
) -> Result<Json<Vec<Change>>, (StatusCode, String)> {
    let params = query.validate().map_err(bad_request)?;

    client
        .list_changes(&params.project, &params.repository, params.pull_request_id)
        .await
        .map(Json)
        .map_err(upstream_error)
}

/// Returns the raw unified diff as `text/plain`.
pub async fn get_diff(
    State(client): State<BitbucketClient>,
    Query(query): Query<PullRequestDiffQuery>,
) -> Result<String, (StatusCode, String)> {
    let params = query.validate().map_err(bad_request)?;

    client
        .get_diff(
            &params.project,
            &params.repository,
            params.pull_request_id,
            &params.path,
            params.context_lines,
        )
        .await
        .map_err(upstream_error)
}
