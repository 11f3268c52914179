//! HTTP API: repository analysis and contributor breakdown endpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::analysis::{AnalysisError, EffortAnalyzer};
use crate::config::ServerConfig;
use crate::data::{AnalysisReport, ContributorReport};
use crate::git::CommitSource;

/// Plaintext answer of `GET /`.
pub const WELCOME_MESSAGE: &str =
    "Welcome to Repo Rank API! Use /analyze/:owner/:repo to analyze a repository's commits.";

// ── App State ──

/// Collaborators shared by every request.
pub struct AppState {
    /// Where commit histories come from.
    pub source: Arc<dyn CommitSource>,
    /// Scoring workflow.
    pub analyzer: EffortAnalyzer,
}

// ── Responses ──

/// JSON body rendered with two-space indentation.
struct PrettyJson<T>(T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        }
    }
}

struct AppError(AnalysisError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Failed to analyze repository");
        let body = serde_json::json!({
            "error": "Failed to analyze repository",
            "message": self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, PrettyJson(body)).into_response()
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        Self(err)
    }
}

// ── Entrypoint ──

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Repo Rank API listening on http://{addr}");
    info!("Try: http://{addr}/analyze/owner/repo");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

/// Builds the router (for testing without binding to a port).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/analyze/{owner}/{repo}", get(analyze))
        .route("/contributor-effort/{owner}/{repo}", get(contributor_effort))
        .fallback(not_found)
        .layer(middleware::from_fn(only_get))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn only_get(request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }
    next.run(request).await
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

// ── GET / ──

async fn root() -> &'static str {
    WELCOME_MESSAGE
}

// ── GET /analyze/{owner}/{repo} ──

async fn analyze(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<PrettyJson<AnalysisReport>, AppError> {
    let report = state
        .analyzer
        .analyze_repository(state.source.as_ref(), &owner, &repo)
        .await?;
    Ok(PrettyJson(report))
}

// ── GET /contributor-effort/{owner}/{repo} ──

async fn contributor_effort(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<PrettyJson<ContributorReport>, AppError> {
    let report = state
        .analyzer
        .contributor_effort(state.source.as_ref(), &owner, &repo)
        .await?;
    Ok(PrettyJson(report))
}
