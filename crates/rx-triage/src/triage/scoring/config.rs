use serde::{Deserialize, Serialize};

/// Triage policy: every weight and threshold the scorer and classifier use.
///
/// Represented as data rather than scattered literals so policy changes stay
/// auditable and testable on their own. The `Default` impl is the documented
/// production policy; its constants are contractual values, not tuning
/// suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    pub base_score: i16,
    /// One wait point accrues per this many minutes in queue.
    pub minutes_per_wait_point: i64,
    pub max_wait_points: i16,
    pub sla_bonus: SlaBonusSchedule,
    pub chronic_bonus: i16,
    pub preferred_tier_bonus: i16,
    pub refill_history_bonus: i16,
    pub controlled_substance_bonus: i16,
    /// Subtracted, not added: interaction warnings buy review time instead of
    /// racing the order to the front.
    pub interaction_warning_penalty: i16,
    /// Item counts strictly above this earn the large-order bonus.
    pub large_order_threshold: u32,
    pub large_order_bonus: i16,
    pub needs_review_bonus: i16,
    pub rejected_penalty: i16,
    pub low_confidence_threshold: f32,
    pub low_confidence_bonus: i16,
    pub tiers: TierThresholds,
}

/// Stepped bonus over minutes-to-breach. Stepped rather than linear so an
/// imminent breach stays sharply distinguishable from a distant one. An
/// already-breached order has negative minutes remaining and therefore lands
/// in the imminent band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaBonusSchedule {
    pub imminent_minutes: i64,
    pub imminent_bonus: i16,
    pub urgent_minutes: i64,
    pub urgent_bonus: i16,
    pub approaching_minutes: i64,
    pub approaching_bonus: i16,
    pub distant_bonus: i16,
}

impl SlaBonusSchedule {
    /// Bonus for a known minutes-to-breach figure. Orders with no deadline
    /// never reach this; absence simply adds nothing.
    pub fn bonus_for(&self, minutes_to_breach: i64) -> i16 {
        if minutes_to_breach < self.imminent_minutes {
            self.imminent_bonus
        } else if minutes_to_breach < self.urgent_minutes {
            self.urgent_bonus
        } else if minutes_to_breach < self.approaching_minutes {
            self.approaching_bonus
        } else {
            self.distant_bonus
        }
    }
}

/// Score cutoffs for the urgency tiers, evaluated from critical downward so
/// boundary scores land in the higher tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub critical: u8,
    pub high: u8,
    pub normal: u8,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            base_score: 50,
            minutes_per_wait_point: 3,
            max_wait_points: 30,
            sla_bonus: SlaBonusSchedule {
                imminent_minutes: 30,
                imminent_bonus: 20,
                urgent_minutes: 60,
                urgent_bonus: 15,
                approaching_minutes: 120,
                approaching_bonus: 10,
                distant_bonus: 5,
            },
            chronic_bonus: 10,
            preferred_tier_bonus: 5,
            refill_history_bonus: 5,
            controlled_substance_bonus: 10,
            interaction_warning_penalty: 10,
            large_order_threshold: 5,
            large_order_bonus: 5,
            needs_review_bonus: 15,
            rejected_penalty: 20,
            low_confidence_threshold: 0.7,
            low_confidence_bonus: 5,
            tiers: TierThresholds {
                critical: 85,
                high: 65,
                normal: 35,
            },
        }
    }
}
