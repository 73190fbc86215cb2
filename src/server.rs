//! HTTP transport.
//!
//! A thin axum layer over [`Orchestrator`]: one query endpoint plus a health
//! probe. No orchestration logic lives here: malformed input is the only
//! condition mapped to an HTTP error, everything else is a normal answer.

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::config::SiftConfig;
use crate::orchestrator::state::{FinalAnswer, Query};
use crate::orchestrator::{Orchestrator, QueryError};

/// Build the application router around a shared orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/healthz", get(healthz))
        .with_state(orchestrator)
}

/// Start the HTTP server and block until ctrl-c.
pub async fn serve(config: SiftConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);

    let app = router(orchestrator);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "sift listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

async fn query(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(query): Json<Query>,
) -> Result<Json<FinalAnswer>, (StatusCode, Json<serde_json::Value>)> {
    match orchestrator.run(query).await {
        Ok(answer) => Ok(Json(answer)),
        Err(e @ QueryError::EmptyQuestion) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )),
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
