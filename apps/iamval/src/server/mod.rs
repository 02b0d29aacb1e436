//! Web front end: a single page plus a small JSON API.
//!
//! Routes:
//! - `GET /` page with the current identity
//! - `GET /healthz`
//! - `GET /api/profiles`, `POST /api/set-profile`
//! - `POST /api/validate`, `GET /api/examples`

mod handlers;
mod page;

use crate::analyzer::ActiveAnalyzer;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<ActiveAnalyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<ActiveAnalyzer>) -> Self {
        Self { analyzer }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/healthz", get(handlers::healthz_handler))
        .route("/api/profiles", get(handlers::profiles_handler))
        .route("/api/set-profile", post(handlers::set_profile_handler))
        .route("/api/validate", post(handlers::validate_handler))
        .route("/api/examples", get(handlers::examples_handler))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting IAM policy validator web interface on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
