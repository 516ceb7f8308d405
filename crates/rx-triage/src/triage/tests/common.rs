use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::triage::domain::{
    AiVerification, AiVerificationStatus, OrderContext, OrderFlags, OrderId, OrderStatus,
    OrderSubmission, PatientFlags, PriorityScore,
};
use crate::triage::intake::IntakeGuard;
use crate::triage::repository::{
    EscalationAlert, EscalationError, EscalationPublisher, OrderRepository, RepositoryError,
    TriageRecord,
};
use crate::triage::scoring::{classify, TriageOutcome};
use crate::triage::{triage_router, TriageConfig, TriageEngine, TriageService};

/// Reference instants for deterministic SLA math.
pub(super) fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 4, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn minutes_after(start: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    start + chrono::Duration::minutes(minutes)
}

pub(super) fn triage_config() -> TriageConfig {
    TriageConfig::default()
}

pub(super) fn approved_ai(confidence: f32) -> AiVerification {
    AiVerification {
        status: AiVerificationStatus::Approved,
        confidence,
        attention_flags: Vec::new(),
    }
}

pub(super) fn submission() -> OrderSubmission {
    OrderSubmission {
        order_number: "RX-2201".to_string(),
        received_at: received_at(),
        promised_at: Some(minutes_after(received_at(), 150)),
        status: OrderStatus::PendingVerification,
        patient: PatientFlags {
            is_chronic: true,
            is_preferred_tier: false,
            has_refill_history: true,
        },
        order: OrderFlags {
            has_controlled_substance: false,
            has_interaction_warning: false,
            item_count: 2,
        },
        ai: Some(approved_ai(0.94)),
    }
}

pub(super) fn numbered_submission(order_number: &str) -> OrderSubmission {
    OrderSubmission {
        order_number: order_number.to_string(),
        ..submission()
    }
}

/// Quiet baseline context: no wait, no deadline, no flags, confident AI.
pub(super) fn context(suffix: &str) -> OrderContext {
    OrderContext {
        order_id: OrderId(format!("RX-{suffix}")),
        minutes_in_queue: 0,
        minutes_to_breach: None,
        patient: PatientFlags::default(),
        order: OrderFlags {
            has_controlled_substance: false,
            has_interaction_warning: false,
            item_count: 1,
        },
        ai: approved_ai(0.95),
    }
}

pub(super) fn engine() -> TriageEngine {
    TriageEngine::new(triage_config())
}

pub(super) fn guard() -> IntakeGuard {
    IntakeGuard::default()
}

/// Synthetic outcome at an exact score, for queue ordering tests.
pub(super) fn outcome(suffix: &str, score: i16) -> TriageOutcome {
    let score = PriorityScore::clamped(score);
    TriageOutcome {
        order_id: OrderId(format!("RX-{suffix}")),
        score,
        tier: classify(score, &triage_config().tiers),
        components: Vec::new(),
    }
}

pub(super) fn build_service() -> (
    TriageService<MemoryRepository, MemoryEscalations>,
    Arc<MemoryRepository>,
    Arc<MemoryEscalations>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let escalations = Arc::new(MemoryEscalations::default());
    let service = TriageService::new(repository.clone(), escalations.clone(), triage_config());
    (service, repository, escalations)
}

/// Insertion-ordered store so board assertions stay deterministic.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<TriageRecord>>>,
}

impl OrderRepository for MemoryRepository {
    fn insert(&self, record: TriageRecord) -> Result<TriageRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.profile.order_id == record.profile.order_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: TriageRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard
            .iter_mut()
            .find(|existing| existing.profile.order_id == record.profile.order_id)
        {
            Some(existing) => *existing = record,
            None => guard.push(record),
        }
        Ok(())
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<TriageRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .find(|record| &record.profile.order_id == id)
            .cloned())
    }

    fn open_orders(&self, limit: usize) -> Result<Vec<TriageRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| !record.profile.status.is_terminal())
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEscalations {
    events: Arc<Mutex<Vec<EscalationAlert>>>,
}

impl MemoryEscalations {
    pub(super) fn events(&self) -> Vec<EscalationAlert> {
        self.events.lock().expect("escalation mutex poisoned").clone()
    }
}

impl EscalationPublisher for MemoryEscalations {
    fn publish(&self, alert: EscalationAlert) -> Result<(), EscalationError> {
        self.events
            .lock()
            .expect("escalation mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct ConflictRepository;

impl OrderRepository for ConflictRepository {
    fn insert(&self, _record: TriageRecord) -> Result<TriageRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: TriageRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &OrderId) -> Result<Option<TriageRecord>, RepositoryError> {
        Ok(None)
    }

    fn open_orders(&self, _limit: usize) -> Result<Vec<TriageRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl OrderRepository for UnavailableRepository {
    fn insert(&self, _record: TriageRecord) -> Result<TriageRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: TriageRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &OrderId) -> Result<Option<TriageRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn open_orders(&self, _limit: usize) -> Result<Vec<TriageRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct FailingEscalations;

impl EscalationPublisher for FailingEscalations {
    fn publish(&self, _alert: EscalationAlert) -> Result<(), EscalationError> {
        Err(EscalationError::Transport("pager webhook down".to_string()))
    }
}

pub(super) fn assert_conflict_response(response: Response) {
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn triage_router_with_service(
    service: TriageService<MemoryRepository, MemoryEscalations>,
) -> axum::Router {
    triage_router(Arc::new(service))
}
