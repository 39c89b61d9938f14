//! HTTP surface for the pipeline.
//!
//! Available on the `server` feature (requires `axum` and `tower-http`).
//!
//! # Endpoints
//!
//! - `POST /api/multi-agent`: body `{ "query": string }`, responds with the
//!   [`PipelineResult`](crate::agent::PipelineResult) JSON. A missing, non-string or blank query
//!   yields `400 { "error": "Query is required" }`; a crashed run yields
//!   `500 { "error": "Internal server error" }`.
//! - `GET /health`: liveness probe, `{ "status": "ok" }`.
//!
//! CORS is permissive so the browser front-end can call the route from its own origin.

use crate::pipeline::{normalize_query, Pipeline};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Build the application router.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/api/multi-agent", post(multi_agent))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(AppState { pipeline })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn multi_agent(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            log::warn!("POST /api/multi-agent: rejected body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Query is required");
        }
    };

    let query = match body.get("query").and_then(Value::as_str).and_then(normalize_query) {
        Some(query) => query.to_string(),
        None => return error_response(StatusCode::BAD_REQUEST, "Query is required"),
    };

    // The run gets its own task so a panic inside it surfaces as a 500 instead of a dropped
    // connection.
    let pipeline = state.pipeline.clone();
    match tokio::spawn(async move { pipeline.run(&query).await }).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            log::error!("POST /api/multi-agent: pipeline task failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Bind `addr` and serve the router until the process exits.
pub async fn serve(
    pipeline: Arc<Pipeline>,
    addr: SocketAddr,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("roomcouncil listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}
