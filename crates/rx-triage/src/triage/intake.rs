use super::domain::{OrderId, OrderProfile, OrderSubmission};

/// Validation errors raised by the intake guard.
#[derive(Debug, thiserror::Error)]
pub enum IntakeViolation {
    #[error("order number must not be empty")]
    MissingOrderNumber,
    #[error("order {0} is missing its AI verification result")]
    MissingVerification(String),
    #[error("order {order} carries a non-finite AI confidence")]
    UnusableConfidence { order: String },
    #[error("order {0} contains no items")]
    EmptyOrder(String),
}

/// Guard responsible for producing [`OrderProfile`] instances.
///
/// Structural defects fail fast here, before any scoring: a missing AI
/// sub-record or an empty order would otherwise be silently defaulted into a
/// medical-urgency calculation, masking a data-integrity problem upstream.
/// Range problems are normalized instead: a finite confidence outside
/// [0, 1] is clamped, not rejected.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    /// Convert an inbound submission into a validated order profile.
    pub fn profile_from_submission(
        &self,
        submission: OrderSubmission,
    ) -> Result<OrderProfile, IntakeViolation> {
        let order_number = submission.order_number.trim().to_string();
        if order_number.is_empty() {
            return Err(IntakeViolation::MissingOrderNumber);
        }

        let mut ai = submission
            .ai
            .ok_or_else(|| IntakeViolation::MissingVerification(order_number.clone()))?;

        if !ai.confidence.is_finite() {
            return Err(IntakeViolation::UnusableConfidence {
                order: order_number,
            });
        }
        ai.confidence = ai.confidence.clamp(0.0, 1.0);

        if submission.order.item_count == 0 {
            return Err(IntakeViolation::EmptyOrder(order_number));
        }

        Ok(OrderProfile {
            order_id: OrderId(order_number),
            received_at: submission.received_at,
            promised_at: submission.promised_at,
            status: submission.status,
            patient: submission.patient,
            order: submission.order,
            ai,
        })
    }
}
