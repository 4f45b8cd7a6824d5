// src/server.rs

//! HTTP transport for the scheduler.
//!
//! - `POST /scheduler`: RPC endpoint (see [`crate::api`])
//! - `GET|POST /cron`: run one due sweep
//! - `GET /health`: liveness and site count

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::api::{self, parse_request};
use crate::error::{AppError, Result};
use crate::report::{ErrorBody, SweepReport};
use crate::scheduler::Scheduler;

#[derive(Clone)]
struct AppState {
    scheduler: Arc<Scheduler>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    monitored_sites: usize,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody::from(&self);
        let status = StatusCode::from_u16(body.kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

/// Build the router.
pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/scheduler", post(scheduler_handler))
        .route("/cron", get(cron_handler).post(cron_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { scheduler })
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(bind: &str, scheduler: Arc<Scheduler>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| AppError::config(format!("invalid bind address {bind}: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, router(scheduler))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn scheduler_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<api::Response>, AppError> {
    let request = parse_request(&body).inspect_err(|e| log::warn!("Rejected request: {}", e))?;
    let response = api::handle(&state.scheduler, request).await?;
    Ok(Json(response))
}

async fn cron_handler(State(state): State<AppState>) -> Json<SweepReport> {
    let results = state.scheduler.check_due().await;
    let total = state.scheduler.registry().len().await;
    Json(SweepReport::new(&results, total))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        monitored_sites: state.scheduler.registry().len().await,
    })
}
