//! Pharmacy order triage: intake, scoring, queue assembly, and the HTTP surface.
//!
//! The flow mirrors the fulfillment floor. Orders arrive as raw submissions,
//! pass the intake guard, get scored against the triage policy, and land on a
//! priority board grouped by tier. Operator actions are derived per order from
//! its fulfillment and verification state.

pub mod actions;
pub mod backlog;
pub mod domain;
pub(crate) mod intake;
pub mod queue;
pub mod repository;
pub mod router;
pub(crate) mod scoring;
pub mod service;
pub mod sla;

#[cfg(test)]
mod tests;

pub use actions::{available_actions, OperatorAction};
pub use backlog::{BacklogImportError, BacklogImporter};
pub use domain::{
    AiVerification, AiVerificationStatus, OrderContext, OrderFlags, OrderId, OrderProfile,
    OrderStatus, OrderSubmission, PatientFlags, PriorityScore, PriorityTier,
};
pub use intake::{IntakeGuard, IntakeViolation};
pub use queue::{group_by_tier, sort_by_priority};
pub use repository::{
    EscalationAlert, EscalationError, EscalationPublisher, OrderRepository, OrderStatusView,
    RepositoryError, TriageRecord,
};
pub use router::triage_router;
pub use scoring::{
    classify, ScoreComponent, ScoreFactor, SlaBonusSchedule, TierThresholds, TriageConfig,
    TriageEngine, TriageOutcome,
};
pub use service::{
    QueueEntry, TierGroup, TriageBoard, TriageService, TriageServiceError,
};
