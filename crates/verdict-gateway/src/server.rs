use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use verdict_core::{Action, DecisionStore, Pipeline, Status};

use crate::metrics::{Metrics, MetricsSnapshot};
use crate::types::*;
use crate::webhook::WebhookNotifier;

/// Upper bound on submitted file contents, in bytes.
pub const MAX_CONTENTS_LENGTH: usize = 200_000;

const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<DecisionStore>,
    pub metrics: Arc<Metrics>,
    pub webhook: Option<Arc<WebhookNotifier>>,
    pub allowed_origins: Vec<String>,
}

/// Create the Axum router with all routes
pub fn create_router(state: AppState) -> Router {
    // Build CORS layer
    let cors = if state.allowed_origins.is_empty() {
        // Permissive for development
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(
                state
                    .allowed_origins
                    .iter()
                    .map(|s| s.parse().unwrap())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_snapshot))
        .route("/api/v1/actions", post(propose_action))
        .route("/api/v1/riskcards", get(list_riskcards))
        .route("/api/v1/riskcards/latest", get(latest_riskcard))
        .route("/api/v1/riskcards/{id}", get(get_riskcard))
        .route("/api/v1/riskcards/{id}/approve", post(approve_riskcard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the gateway server
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!(addr = %addr, "Starting gateway server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received, draining connections...");
}

// --- REST Handlers ---

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics_snapshot(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn propose_action(
    State(state): State<AppState>,
    Json(req): Json<ProposeActionRequest>,
) -> Result<Json<ProposeActionResponse>, (StatusCode, Json<ErrorResponse>)> {
    if req.new_contents.len() > MAX_CONTENTS_LENGTH {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse {
                error: format!("new_contents exceeds {} bytes", MAX_CONTENTS_LENGTH),
            }),
        ));
    }

    let action = Action {
        intent: req.intent,
        file_path: req.file_path,
        new_contents: req.new_contents,
        use_remote_sandbox: req.use_remote_sandbox,
    };

    let started = Instant::now();
    match state.pipeline.submit(action).await {
        Ok(decision) => {
            state
                .metrics
                .record("propose_action", started.elapsed(), true);
            if decision.card.status == Status::Blocked {
                if let Some(webhook) = &state.webhook {
                    let webhook = webhook.clone();
                    let card = decision.card.clone();
                    tokio::spawn(async move { webhook.notify(&card).await });
                }
            }
            let request_id = decision.card.request_id.clone();
            Ok(Json(ProposeActionResponse {
                allowed: decision.allowed,
                risk_card: decision.card,
                request_id,
            }))
        }
        Err(e) => {
            state
                .metrics
                .record("propose_action", started.elapsed(), false);
            error!(error = %format!("{e:#}"), "pipeline run failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            ))
        }
    }
}

async fn list_riskcards(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    match state.store.history(limit) {
        Ok(history) => Ok(Json(HistoryResponse { history })),
        Err(e) => {
            error!(error = %format!("{e:#}"), "history lookup failed");
            Err(internal_error())
        }
    }
}

async fn latest_riskcard(
    State(state): State<AppState>,
) -> Result<Json<verdict_core::RiskCard>, (StatusCode, Json<ErrorResponse>)> {
    match state.pipeline.latest().await {
        Some(card) => Ok(Json(card)),
        None => Err(not_found()),
    }
}

async fn get_riskcard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<verdict_core::RiskCard>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(&id) {
        Ok(Some(card)) => Ok(Json(card)),
        Ok(None) => Err(not_found()),
        Err(e) => {
            error!(error = %format!("{e:#}"), request_id = %id, "risk card lookup failed");
            Err(internal_error())
        }
    }
}

async fn approve_riskcard(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<ApproveResponse>, (StatusCode, Json<ErrorResponse>)> {
    let started = Instant::now();
    match state.store.approve(&id, &req.approved_by) {
        Ok(true) => {
            state.metrics.record("approve", started.elapsed(), true);
            info!(request_id = %id, approved_by = %req.approved_by, "risk card approved");
            Ok(Json(ApproveResponse {
                request_id: id,
                approved: true,
                approved_by: req.approved_by,
            }))
        }
        Ok(false) => {
            state.metrics.record("approve", started.elapsed(), false);
            Err(not_found())
        }
        Err(e) => {
            state.metrics.record("approve", started.elapsed(), false);
            error!(error = %format!("{e:#}"), request_id = %id, "approval failed");
            Err(internal_error())
        }
    }
}

fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal error".to_string(),
        }),
    )
}
