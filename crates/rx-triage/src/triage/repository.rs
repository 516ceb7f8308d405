use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{OrderId, OrderProfile};
use super::scoring::TriageOutcome;

/// Repository record pairing a validated order with its latest triage result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRecord {
    pub profile: OrderProfile,
    pub outcome: Option<TriageOutcome>,
}

impl TriageRecord {
    pub fn status_view(&self) -> OrderStatusView {
        OrderStatusView {
            order_id: self.profile.order_id.clone(),
            status: self.profile.status.label(),
            ai_status: self.profile.ai.status.label(),
            score: self.outcome.as_ref().map(|outcome| outcome.score.value()),
            tier: self.outcome.as_ref().map(|outcome| outcome.tier.label()),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait OrderRepository: Send + Sync {
    fn insert(&self, record: TriageRecord) -> Result<TriageRecord, RepositoryError>;
    fn update(&self, record: TriageRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OrderId) -> Result<Option<TriageRecord>, RepositoryError>;
    /// Open (non-terminal) orders, the raw material of the triage board.
    fn open_orders(&self, limit: usize) -> Result<Vec<TriageRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("order already exists")]
    Conflict,
    #[error("order not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for critical-tier escalations (pager, chat, dashboard).
pub trait EscalationPublisher: Send + Sync {
    fn publish(&self, alert: EscalationAlert) -> Result<(), EscalationError>;
}

/// Alert payload so routes and tests can assert the integration boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationAlert {
    pub channel: String,
    pub order_id: OrderId,
    pub details: BTreeMap<String, String>,
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    #[error("escalation transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an order's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: &'static str,
    pub ai_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'static str>,
}
