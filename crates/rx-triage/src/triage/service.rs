use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::actions::{available_actions, OperatorAction};
use super::domain::{OrderId, OrderSubmission, PriorityTier};
use super::intake::{IntakeGuard, IntakeViolation};
use super::queue::group_by_tier;
use super::repository::{
    EscalationAlert, EscalationError, EscalationPublisher, OrderRepository, RepositoryError,
    TriageRecord,
};
use super::scoring::{TriageConfig, TriageEngine, TriageOutcome};

/// Service composing the intake guard, repository, escalation hook, and
/// scoring engine. All clock reads stay with the caller: `triage` and
/// `board` take "now" explicitly.
pub struct TriageService<R, P> {
    guard: Arc<IntakeGuard>,
    repository: Arc<R>,
    escalations: Arc<P>,
    engine: Arc<TriageEngine>,
}

impl<R, P> TriageService<R, P>
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, escalations: Arc<P>, config: TriageConfig) -> Self {
        Self {
            guard: Arc::new(IntakeGuard),
            repository,
            escalations,
            engine: Arc::new(TriageEngine::new(config)),
        }
    }

    /// Accept a new order, returning the repository-backed record. The order
    /// number is the identity; resubmitting one surfaces a conflict.
    pub fn submit(&self, submission: OrderSubmission) -> Result<TriageRecord, TriageServiceError> {
        let profile = self.guard.profile_from_submission(submission)?;

        let record = TriageRecord {
            profile,
            outcome: None,
        };

        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Score an order at an explicit instant, persist the outcome, and raise
    /// an escalation when it classifies critical.
    pub fn triage(
        &self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<TriageOutcome, TriageServiceError> {
        let mut record = self
            .repository
            .fetch(order_id)?
            .ok_or(RepositoryError::NotFound)?;

        let context = record.profile.context_at(now);
        let outcome = self.engine.score(&context);

        record.outcome = Some(outcome.clone());
        self.repository.update(record)?;

        if outcome.tier == PriorityTier::Critical {
            let mut details = BTreeMap::new();
            details.insert("score".to_string(), outcome.score.value().to_string());
            details.insert("tier".to_string(), outcome.tier.label().to_string());
            self.escalations.publish(EscalationAlert {
                channel: "critical_queue".to_string(),
                order_id: outcome.order_id.clone(),
                details,
            })?;
        }

        Ok(outcome)
    }

    /// Fetch an order and its latest outcome for status display.
    pub fn get(&self, order_id: &OrderId) -> Result<TriageRecord, TriageServiceError> {
        let record = self
            .repository
            .fetch(order_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Build the pharmacist work queue: score every open order at `now`,
    /// group by tier, and attach each order's legal actions. Scores computed
    /// here are a presentation snapshot and are not written back.
    pub fn board(&self, now: DateTime<Utc>, limit: usize) -> Result<TriageBoard, TriageServiceError> {
        let records = self.repository.open_orders(limit)?;

        let mut entries: HashMap<OrderId, QueueEntry> = HashMap::new();
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            let context = record.profile.context_at(now);
            let outcome = self.engine.score(&context);
            entries.insert(
                record.profile.order_id.clone(),
                QueueEntry {
                    order_id: record.profile.order_id.clone(),
                    status: record.profile.status.label(),
                    score: outcome.score.value(),
                    tier: outcome.tier.label(),
                    minutes_in_queue: context.minutes_in_queue,
                    minutes_to_breach: context.minutes_to_breach,
                    actions: available_actions(
                        record.profile.status,
                        record.profile.ai.status,
                        record.profile.order.has_controlled_substance,
                    ),
                },
            );
            outcomes.push(outcome);
        }

        let total = outcomes.len();
        let tiers = group_by_tier(outcomes)
            .into_iter()
            .map(|(tier, group)| TierGroup {
                tier: tier.label(),
                orders: group
                    .into_iter()
                    .filter_map(|outcome| entries.remove(&outcome.order_id))
                    .collect(),
            })
            .collect();

        Ok(TriageBoard {
            generated_at: now,
            total,
            tiers,
        })
    }
}

/// Error raised by the triage service.
#[derive(Debug, thiserror::Error)]
pub enum TriageServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Escalation(#[from] EscalationError),
}

/// Work-queue view: per-tier groups in critical-to-low order.
#[derive(Debug, Clone, Serialize)]
pub struct TriageBoard {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub tiers: Vec<TierGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierGroup {
    pub tier: &'static str,
    pub orders: Vec<QueueEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub order_id: OrderId,
    pub status: &'static str,
    pub score: u8,
    pub tier: &'static str,
    pub minutes_in_queue: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_to_breach: Option<i64>,
    pub actions: Vec<OperatorAction>,
}
