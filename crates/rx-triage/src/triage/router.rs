use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{OrderId, OrderStatus, OrderSubmission};
use super::repository::{EscalationPublisher, OrderRepository, RepositoryError};
use super::service::{TriageService, TriageServiceError};

const DEFAULT_BOARD_LIMIT: usize = 50;

/// Router builder exposing HTTP endpoints for order intake and triage.
pub fn triage_router<R, P>(service: Arc<TriageService<R, P>>) -> Router
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/triage/orders", post(submit_handler::<R, P>))
        .route(
            "/api/v1/triage/orders/:order_number",
            get(status_handler::<R, P>),
        )
        .route(
            "/api/v1/triage/orders/:order_number/score",
            post(score_handler::<R, P>),
        )
        .route("/api/v1/triage/queue", get(queue_handler::<R, P>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TriageParams {
    /// Scoring instant; defaults to the current time. This is the only place
    /// the triage path reads a clock.
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueParams {
    pub(crate) now: Option<DateTime<Utc>>,
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn submit_handler<R, P>(
    State(service): State<Arc<TriageService<R, P>>>,
    axum::Json(submission): axum::Json<OrderSubmission>,
) -> Response
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    match service.submit(submission) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::ACCEPTED, axum::Json(view)).into_response()
        }
        Err(TriageServiceError::Intake(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(TriageServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "order already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<R, P>(
    State(service): State<Arc<TriageService<R, P>>>,
    Path(order_number): Path<String>,
) -> Response
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    let id = OrderId(order_number);
    match service.get(&id) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(TriageServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "order_id": id.0,
                "status": OrderStatus::PendingVerification.label(),
                "ai_status": serde_json::Value::Null,
                "score": serde_json::Value::Null,
                "tier": serde_json::Value::Null,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn score_handler<R, P>(
    State(service): State<Arc<TriageService<R, P>>>,
    Path(order_number): Path<String>,
    Query(params): Query<TriageParams>,
) -> Response
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    let id = OrderId(order_number);
    let now = params.now.unwrap_or_else(Utc::now);

    match service.triage(&id, now) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(TriageServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "order not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn queue_handler<R, P>(
    State(service): State<Arc<TriageService<R, P>>>,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    let now = params.now.unwrap_or_else(Utc::now);
    let limit = params.limit.unwrap_or(DEFAULT_BOARD_LIMIT);

    match service.board(now, limit) {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
