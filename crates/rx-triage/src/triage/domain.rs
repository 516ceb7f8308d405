use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sla;

/// Identifier wrapper for fulfillment orders. Wraps the order number assigned
/// by the pharmacy system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Fulfillment stage of an order. This crate never transitions the status; it
/// only reads it to decide which operator actions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingVerification,
    PharmacistReview,
    Approved,
    Preparing,
    Ready,
    AwaitingCourier,
    Completed,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::PendingVerification,
            Self::PharmacistReview,
            Self::Approved,
            Self::Preparing,
            Self::Ready,
            Self::AwaitingCourier,
            Self::Completed,
            Self::Rejected,
            Self::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingVerification => "pending_verification",
            Self::PharmacistReview => "pharmacist_review",
            Self::Approved => "approved",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::AwaitingCourier => "awaiting_courier",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal orders never reappear on the work queue.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }
}

/// Machine-readability verdict supplied by the external AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiVerificationStatus {
    Approved,
    NeedsReview,
    Rejected,
}

impl AiVerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::NeedsReview => "needs_review",
            Self::Rejected => "rejected",
        }
    }
}

/// AI verification payload, consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiVerification {
    pub status: AiVerificationStatus,
    pub confidence: f32,
    #[serde(default)]
    pub attention_flags: Vec<String>,
}

/// Patient-level priority signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFlags {
    pub is_chronic: bool,
    pub is_preferred_tier: bool,
    pub has_refill_history: bool,
}

/// Order-level priority signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFlags {
    pub has_controlled_substance: bool,
    pub has_interaction_warning: bool,
    pub item_count: u32,
}

/// Raw inbound order record, as received from the fulfillment system. The
/// intake guard turns it into an [`OrderProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub order_number: String,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub promised_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub patient: PatientFlags,
    pub order: OrderFlags,
    #[serde(default)]
    pub ai: Option<AiVerification>,
}

/// Validated order record. Unlike a submission, the AI verification
/// sub-record is always present here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderProfile {
    pub order_id: OrderId,
    pub received_at: DateTime<Utc>,
    pub promised_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub patient: PatientFlags,
    pub order: OrderFlags,
    pub ai: AiVerification,
}

impl OrderProfile {
    /// Snapshot the profile's scoring inputs at an explicit instant. Time
    /// figures are derived here so the scorer itself never touches a clock.
    pub fn context_at(&self, now: DateTime<Utc>) -> OrderContext {
        OrderContext {
            order_id: self.order_id.clone(),
            minutes_in_queue: sla::minutes_in_queue(self.received_at, now),
            minutes_to_breach: sla::minutes_to_breach(self.promised_at, now),
            patient: self.patient,
            order: self.order,
            ai: self.ai.clone(),
        }
    }
}

/// Immutable scoring input for a single order at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderContext {
    pub order_id: OrderId,
    pub minutes_in_queue: i64,
    pub minutes_to_breach: Option<i64>,
    pub patient: PatientFlags,
    pub order: OrderFlags,
    pub ai: AiVerification,
}

/// Priority score, always within [0, 100].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PriorityScore(u8);

impl PriorityScore {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Clamp a raw point total into the valid range.
    pub fn clamped(raw: i16) -> Self {
        Self(raw.clamp(0, 100) as u8)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Coarse urgency bucket derived from a [`PriorityScore`]. Declaration order
/// is most to least urgent, which also drives board ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Critical,
    High,
    Normal,
    Low,
}

impl PriorityTier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Critical, Self::High, Self::Normal, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}
