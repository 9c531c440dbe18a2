// src/server/handlers.rs

//! Request handlers for the query server.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Instant;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::extract::scan_str;
use crate::server::AppState;
use crate::store::search::{search_bm25, SearchResult};

/// Default number of rankings returned.
const DEFAULT_LIMIT: i64 = 10;
/// Hard ceiling on the rankings a single query may return.
const MAX_LIMIT: i64 = 100;

/// JSON request body for `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// JSON response body for `POST /query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub rankings: Vec<SearchResult>,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// `POST /query`: evaluate a BM25 query.
pub async fn query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();

    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid JSON request"),
    };

    let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let terms = match tokenize_query(&req.query) {
        Ok(terms) => terms,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    info!(terms = ?terms, limit, "evaluating query");

    match search_bm25(&state.store.pool, &terms, limit).await {
        Ok(rankings) => {
            info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                results = rankings.len(),
                "query processed"
            );
            Json(QueryResponse { rankings }).into_response()
        }
        Err(e) => {
            error!(error = %e, query = %req.query, "search failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "search failed")
        }
    }
}

/// `GET /health`.
pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// `GET /`: the search front end.
pub async fn index_page(State(state): State<AppState>) -> Response {
    serve_file(&state, "index.html").await
}

/// `GET /static/<path>`: static assets.
pub async fn static_asset(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    if is_traversal(&path) {
        return StatusCode::NOT_FOUND.into_response();
    }
    serve_file(&state, &path).await
}

async fn serve_file(state: &AppState, path: &str) -> Response {
    let full = state.assets_dir.join(path);
    match tokio::fs::read(&full).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, content_type(path))],
            bytes,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Reject paths that climb out of the assets directory.
fn is_traversal(path: &str) -> bool {
    path.contains("..") || path.contains("//")
}

/// Minimal content-type table for the bundled assets.
fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Tokenize a query with the document scanner so both sides agree.
fn tokenize_query(query: &str) -> Result<Vec<String>> {
    if query.is_empty() {
        return Err(AppError::bad_query("query cannot be empty"));
    }
    let terms = scan_str(query);
    if terms.is_empty() {
        return Err(AppError::bad_query("no valid terms found in query"));
    }
    Ok(terms)
}
