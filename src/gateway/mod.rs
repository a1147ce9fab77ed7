pub mod handlers;
pub mod identity;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;

use crate::config::GatewayConfig;
use state::AppState;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Build the HTTP router
pub fn build_router(state: Arc<AppState>) -> Router {
    let transfer_routes = Router::new().route("/{id}/receipt", get(handlers::get_receipt));

    let account_routes = Router::new()
        .route("/{iban}/transfers", get(handlers::get_history))
        .route("/{iban}/summary", get(handlers::get_summary))
        .route("/{iban}/categories", get(handlers::get_categories))
        .route("/{iban}/weekly-trend", get(handlers::get_weekly_trend));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/transfers", post(handlers::create_transfer))
        .nest("/api/v1/transfers", transfer_routes)
        .nest("/api/v1/accounts", account_routes)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port in use?)", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
