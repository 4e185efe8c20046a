//! Health endpoint for process supervisors and load balancers

use crate::observability::{Metrics, MetricsSnapshot};
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct HealthState {
    pub worker_id: Uuid,
    pub started_at: OffsetDateTime,
    pub metrics: Arc<Metrics>,
}

impl HealthState {
    pub fn new(worker_id: Uuid, metrics: Arc<Metrics>) -> Self {
        Self {
            worker_id,
            started_at: OffsetDateTime::now_utc(),
            metrics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub worker_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub metrics: MetricsSnapshot,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// Serve `/health` on `address` until `shutdown` turns true
pub async fn serve(
    address: SocketAddr,
    state: HealthState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Health endpoint listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        worker_id: state.worker_id,
        started_at: state.started_at,
        metrics: state.metrics.snapshot(),
    })
}
