mod handlers;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::bitbucket::BitbucketClient;
use crate::mcp;

/// Path the MCP streamable HTTP endpoint is mounted at.
pub const MCP_MOUNT: &str = "/rpr";

pub fn create_router(client: BitbucketClient) -> Router {
    let api = Router::new()
        // Pull requests
        .route("/pr", get(handlers::list_pull_requests))
        .route("/pr/change", get(handlers::list_changes))
        .route("/pr/diff", get(handlers::get_diff));

    Router::new()
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .nest_service(MCP_MOUNT, mcp::streamable_http_service(client.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(client)
}
