//! Streamable HTTP transport: `POST /mcp` for JSON-RPC, `GET /health` for probes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use super::{ServerError, ToolServer};
use crate::congress::RequestContext;

/// Caller-supplied upstream key, overriding the configured one for this request.
pub const API_KEY_OVERRIDE_HEADER: &str = "x-congress-api-key";
pub const SESSION_HEADER: &str = "mcp-session-id";

// Health check handler
async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

fn context_from_headers(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let mut ctx = RequestContext::default();
    if let Some(key) = header(API_KEY_OVERRIDE_HEADER) {
        ctx = ctx.with_api_key(key);
    }
    if let Some(session) = header(SESSION_HEADER) {
        ctx = ctx.with_session(session);
    }
    ctx
}

async fn mcp_handler(State(server): State<ToolServer>, headers: HeaderMap, body: String) -> Response {
    let ctx = context_from_headers(&headers);
    match server.handle_message(&body, &ctx).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub fn router(server: ToolServer) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Serve until ctrl-c.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve_http(server: ToolServer, host: &str, port: u16) -> Result<(), ServerError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Starting server at http://{}/mcp", addr);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("ctrl_c received; shutting down http server");
}
