use super::config::TierThresholds;
use crate::triage::domain::{PriorityScore, PriorityTier};

/// Map a clamped score onto its urgency tier.
///
/// Thresholds are checked from critical downward, so a score sitting exactly
/// on a boundary lands in the higher tier (85 is critical, not high). With
/// scores confined to [0, 100] the four tiers are exhaustive and mutually
/// exclusive.
pub fn classify(score: PriorityScore, thresholds: &TierThresholds) -> PriorityTier {
    let value = score.value();
    if value >= thresholds.critical {
        PriorityTier::Critical
    } else if value >= thresholds.high {
        PriorityTier::High
    } else if value >= thresholds.normal {
        PriorityTier::Normal
    } else {
        PriorityTier::Low
    }
}
