//! Status-driven state machine deciding which operator actions are legal.
//!
//! The table here is a contract with the operator UI: it enumerates legal
//! actions, it never executes them, and it never transitions an order.

use serde::{Deserialize, Serialize};

use super::domain::{AiVerificationStatus, OrderStatus};

/// Actions an operator can take on an order. Serialized identifiers are the
/// published contract (`VIEW_PRESCRIPTION`, `VERIFY`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorAction {
    ViewPrescription,
    Verify,
    Reject,
    CheckInteractions,
    RequestClarification,
    StartPrep,
    MarkReady,
    AssignCourier,
    CallPatient,
}

impl OperatorAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewPrescription => "VIEW_PRESCRIPTION",
            Self::Verify => "VERIFY",
            Self::Reject => "REJECT",
            Self::CheckInteractions => "CHECK_INTERACTIONS",
            Self::RequestClarification => "REQUEST_CLARIFICATION",
            Self::StartPrep => "START_PREP",
            Self::MarkReady => "MARK_READY",
            Self::AssignCourier => "ASSIGN_COURIER",
            Self::CallPatient => "CALL_PATIENT",
        }
    }
}

/// Resolve the ordered set of legal actions for an order.
///
/// Viewing the prescription is always legal. Stage actions follow the status
/// table; verification actions additionally require a usable AI status.
/// Controlled substances append an interaction check in any stage; the
/// insertion is idempotent, so the identifier appears at most once.
pub fn available_actions(
    status: OrderStatus,
    ai_status: AiVerificationStatus,
    has_controlled_substance: bool,
) -> Vec<OperatorAction> {
    let mut actions = vec![OperatorAction::ViewPrescription];

    match status {
        OrderStatus::PendingVerification | OrderStatus::PharmacistReview => {
            match ai_status {
                AiVerificationStatus::Approved => {
                    actions.push(OperatorAction::Verify);
                    actions.push(OperatorAction::Reject);
                    actions.push(OperatorAction::CheckInteractions);
                }
                AiVerificationStatus::NeedsReview => {
                    actions.push(OperatorAction::Verify);
                    actions.push(OperatorAction::Reject);
                    actions.push(OperatorAction::CheckInteractions);
                    actions.push(OperatorAction::RequestClarification);
                }
                AiVerificationStatus::Rejected => {}
            }
        }
        OrderStatus::Approved => {
            actions.push(OperatorAction::StartPrep);
        }
        OrderStatus::Preparing => {
            actions.push(OperatorAction::MarkReady);
        }
        OrderStatus::Ready => {
            actions.push(OperatorAction::AssignCourier);
            actions.push(OperatorAction::CallPatient);
        }
        OrderStatus::AwaitingCourier => {
            actions.push(OperatorAction::CallPatient);
        }
        OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::Cancelled => {}
    }

    if has_controlled_substance && !actions.contains(&OperatorAction::CheckInteractions) {
        actions.push(OperatorAction::CheckInteractions);
    }

    actions
}
