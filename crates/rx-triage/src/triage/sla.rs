//! Pure time arithmetic for queue wait and delivery-deadline figures.
//!
//! Both functions take "now" explicitly; nothing here reads a clock.

use chrono::{DateTime, Utc};

/// Whole minutes an order has waited since it was received. Clock skew can
/// make `received_at` land after `now`; that clamps to zero rather than
/// going negative.
pub fn minutes_in_queue(received_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - received_at).num_minutes().max(0)
}

/// Whole minutes until the promised-delivery deadline passes. Negative means
/// the deadline has already been breached. `None` means no deadline exists,
/// which is a valid state rather than an error.
pub fn minutes_to_breach(
    promised_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i64> {
    promised_at.map(|deadline| (deadline - now).num_minutes())
}
