use crate::infra::{AppState, InMemoryEscalationPublisher, InMemoryOrderRepository};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use rx_triage::capture::{CaptureAnalysis, CaptureGate, CaptureVerdict};
use rx_triage::error::AppError;
use rx_triage::triage::{
    triage_router, BacklogImporter, EscalationPublisher, OrderRepository, OrderSubmission,
    TriageBoard, TriageConfig, TriageService, TriageServiceError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct QueuePreviewRequest {
    /// Scoring instant; defaults to the current time.
    #[serde(default)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Board size cap; defaults to the configured limit.
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// Inline backlog CSV export. When present, `orders` is ignored.
    #[serde(default)]
    pub(crate) backlog_csv: Option<String>,
    #[serde(default)]
    pub(crate) orders: Vec<OrderSubmission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueuePreviewResponse {
    pub(crate) data_source: QueueDataSource,
    pub(crate) accepted: usize,
    pub(crate) rejected: Vec<RejectedSubmission>,
    pub(crate) board: TriageBoard,
}

#[derive(Debug, Serialize)]
pub(crate) struct RejectedSubmission {
    pub(crate) order_number: String,
    pub(crate) reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum QueueDataSource {
    Backlog,
    Inline,
}

pub(crate) fn with_triage_routes<R, P>(
    service: Arc<TriageService<R, P>>,
    preview_limit: usize,
) -> axum::Router
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    triage_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/triage/queue/preview",
            axum::routing::post(move |payload: Json<QueuePreviewRequest>| {
                queue_preview_endpoint(preview_limit, payload)
            }),
        )
        .route(
            "/api/v1/capture/check",
            axum::routing::post(capture_check_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Score a batch of orders without touching the live queue. Accepts either an
/// inline backlog CSV export or raw submissions; each request scores against
/// a throwaway store, so previews never collide with submitted orders.
pub(crate) async fn queue_preview_endpoint(
    default_limit: usize,
    Json(payload): Json<QueuePreviewRequest>,
) -> Response {
    let QueuePreviewRequest {
        now,
        limit,
        backlog_csv,
        orders,
    } = payload;

    let (submissions, data_source) = if let Some(export) = backlog_csv {
        let reader = Cursor::new(export.into_bytes());
        match BacklogImporter::from_reader(reader) {
            Ok(submissions) => (submissions, QueueDataSource::Backlog),
            Err(error) => return AppError::from(error).into_response(),
        }
    } else {
        (orders, QueueDataSource::Inline)
    };

    let service = TriageService::new(
        Arc::new(InMemoryOrderRepository::default()),
        Arc::new(InMemoryEscalationPublisher::default()),
        TriageConfig::default(),
    );

    let mut accepted = 0;
    let mut rejected = Vec::new();
    for submission in submissions {
        let order_number = submission.order_number.clone();
        match service.submit(submission) {
            Ok(_) => accepted += 1,
            Err(TriageServiceError::Intake(violation)) => rejected.push(RejectedSubmission {
                order_number,
                reason: violation.to_string(),
            }),
            Err(other) => rejected.push(RejectedSubmission {
                order_number,
                reason: other.to_string(),
            }),
        }
    }

    let now = now.unwrap_or_else(Utc::now);
    let board = match service.board(now, limit.unwrap_or(default_limit)) {
        Ok(board) => board,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    let response = QueuePreviewResponse {
        data_source,
        accepted,
        rejected,
        board,
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub(crate) async fn capture_check_endpoint(
    Json(analysis): Json<CaptureAnalysis>,
) -> Json<CaptureVerdict> {
    let gate = CaptureGate::default();
    Json(gate.evaluate(&analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rx_triage::capture::{AngleReading, CaptureIssue, ZoneVisibility};
    use rx_triage::triage::{
        AiVerification, AiVerificationStatus, OrderFlags, OrderStatus, PatientFlags,
    };

    fn preview_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 4, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn quiet_order(now: DateTime<Utc>) -> OrderSubmission {
        OrderSubmission {
            order_number: "RX-QUIET".to_string(),
            received_at: now,
            promised_at: None,
            status: OrderStatus::PendingVerification,
            patient: PatientFlags::default(),
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 1,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::Approved,
                confidence: 0.95,
                attention_flags: Vec::new(),
            }),
        }
    }

    fn hot_order(now: DateTime<Utc>) -> OrderSubmission {
        OrderSubmission {
            order_number: "RX-HOT".to_string(),
            received_at: now - chrono::Duration::minutes(90),
            promised_at: Some(now + chrono::Duration::minutes(20)),
            status: OrderStatus::PharmacistReview,
            patient: PatientFlags {
                is_chronic: true,
                ..PatientFlags::default()
            },
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 2,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::NeedsReview,
                confidence: 0.62,
                attention_flags: vec!["smudged_signature".to_string()],
            }),
        }
    }

    async fn read_json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("valid json body")
    }

    #[tokio::test]
    async fn queue_preview_scores_inline_orders() {
        let now = preview_now();
        let request = QueuePreviewRequest {
            now: Some(now),
            limit: None,
            backlog_csv: None,
            orders: vec![quiet_order(now), hot_order(now)],
        };

        let response = queue_preview_endpoint(50, Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json_body(response).await;
        assert_eq!(body["data_source"], "inline");
        assert_eq!(body["accepted"], 2);
        assert!(body["rejected"].as_array().expect("rejected array").is_empty());
        assert_eq!(body["board"]["total"], 2);

        let critical = &body["board"]["tiers"][0];
        assert_eq!(critical["tier"], "critical");
        assert_eq!(critical["orders"][0]["order_id"], "RX-HOT");
        assert_eq!(critical["orders"][0]["score"], 100);
    }

    #[tokio::test]
    async fn queue_preview_accepts_an_inline_backlog_export() {
        let request = QueuePreviewRequest {
            now: Some(preview_now()),
            limit: None,
            backlog_csv: Some(
                "Order Number,Received At,Promised At,Status,AI Status,AI Confidence,Attention Flags,Chronic,Preferred,Refill History,Controlled,Interaction Warning,Items\n\
RX-5050,2025-11-04T08:00:00Z,2025-11-04T10:00:00Z,pending_verification,approved,0.94,,no,no,yes,no,no,2\n"
                    .to_string(),
            ),
            orders: Vec::new(),
        };

        let response = queue_preview_endpoint(50, Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json_body(response).await;
        assert_eq!(body["data_source"], "backlog");
        assert_eq!(body["accepted"], 1);
        assert_eq!(body["board"]["total"], 1);
    }

    #[tokio::test]
    async fn queue_preview_reports_intake_rejects() {
        let now = preview_now();
        let mut unverified = quiet_order(now);
        unverified.order_number = "RX-NOAI".to_string();
        unverified.ai = None;

        let request = QueuePreviewRequest {
            now: Some(now),
            limit: None,
            backlog_csv: None,
            orders: vec![unverified],
        };

        let response = queue_preview_endpoint(50, Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json_body(response).await;
        assert_eq!(body["accepted"], 0);
        assert_eq!(body["board"]["total"], 0);
        assert_eq!(body["rejected"][0]["order_number"], "RX-NOAI");
        let reason = body["rejected"][0]["reason"].as_str().expect("reason");
        assert!(reason.contains("AI verification"), "reason={reason}");
    }

    #[tokio::test]
    async fn queue_preview_rejects_a_malformed_export() {
        let request = QueuePreviewRequest {
            now: Some(preview_now()),
            limit: None,
            backlog_csv: Some("not,a,backlog\n1,2,3\n".to_string()),
            orders: Vec::new(),
        };

        let response = queue_preview_endpoint(50, Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn capture_check_approves_a_clean_analysis() {
        let analysis = CaptureAnalysis {
            lighting_score: 0.85,
            angle: AngleReading {
                roll: 2.0,
                pitch: -3.0,
                yaw: 40.0,
            },
            blur_detected: false,
            focus_score: 0.9,
            zones: ZoneVisibility::all_visible(),
        };

        let Json(verdict) = capture_check_endpoint(Json(analysis)).await;

        assert!(verdict.approved);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.guidance, "Prescription looks clear. Ready to submit.");
        assert!(verdict.quality_score > 85);
    }

    #[tokio::test]
    async fn capture_check_reports_issues_with_guidance() {
        let analysis = CaptureAnalysis {
            lighting_score: 0.2,
            angle: AngleReading {
                roll: 25.0,
                pitch: 0.0,
                yaw: 0.0,
            },
            blur_detected: false,
            focus_score: 0.9,
            zones: ZoneVisibility::all_visible(),
        };

        let Json(verdict) = capture_check_endpoint(Json(analysis)).await;

        assert!(!verdict.approved);
        assert!(verdict.issues.contains(&CaptureIssue::TooDark));
        assert!(verdict.issues.contains(&CaptureIssue::Tilted));
        assert!(verdict.guidance.contains("brighter"), "guidance={}", verdict.guidance);
    }
}
