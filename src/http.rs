//! HTTP transport module for integral-lens
//!
//! One endpoint per lens, resolved by route lookup into the shared pipeline.
//! Health and info are plain JSON.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::LensError;
use crate::lenses::LensTable;
use crate::pipeline::{InboundCall, LensPipeline};

/// Shared state for HTTP server. Read-only after startup.
#[derive(Clone)]
pub struct HttpState {
    pub pipeline: LensPipeline,
    pub lenses: Arc<LensTable>,
}

impl HttpState {
    pub fn new(pipeline: LensPipeline, lenses: LensTable) -> Self {
        Self {
            pipeline,
            lenses: Arc::new(lenses),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let lenses: Vec<_> = state.lenses.iter().collect();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "lenses": lenses,
            "upstream": {
                "endpoint": state.pipeline.endpoint(),
                "credential_configured": state.pipeline.has_credential()
            }
        })
        .to_string(),
    )
}

/// Lens endpoint shared by every lens
pub async fn lens_handler(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    method: Method,
    body: Bytes,
) -> Response {
    let Some(lens) = state.lenses.get(&name) else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            json!({ "error": format!("Unknown lens: {}", name) }).to_string(),
        )
            .into_response();
    };

    match state.pipeline.run(lens, InboundCall { method, body }).await {
        Ok(result) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            result.into_inner(),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Panicking handlers answer with the catch-all 500
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!("Unexpected failure in lens handler: {}", message);
    LensError::Unexpected { message }.into_response()
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let resp = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    if resp.status().is_server_error() {
        tracing::warn!(%method, %path, status = resp.status().as_u16(), latency_ms, "request failed");
    } else {
        tracing::info!(%method, %path, status = resp.status().as_u16(), latency_ms, "request");
    }
    resp
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/lens/:name", any(lens_handler))
        // Path the existing static front-end posts to
        .route("/.netlify/functions/:name", any(lens_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(config: &Config) -> anyhow::Result<()> {
    if config.runtime.api_key.is_none() {
        tracing::warn!(
            "OPENAI_API_KEY is not set; every lens request will fail with a 500 until it is"
        );
    }

    let pipeline = LensPipeline::from_config(config)?;
    let lenses = LensTable::from_config(config);
    for lens in lenses.iter() {
        tracing::info!(
            "lens '{}' -> model {} ({} keys)",
            lens.name,
            lens.model,
            lens.expected_keys.len()
        );
    }
    let app = build_router(HttpState::new(pipeline, lenses));

    let listener = tokio::net::TcpListener::bind(config.server.http_bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!(
        "Starting HTTP server on {} (upstream {})",
        config.server.http_bind,
        config.upstream.url()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
