mod config;
mod rules;
mod tier;

pub use config::{SlaBonusSchedule, TierThresholds, TriageConfig};
pub use tier::classify;

use serde::{Deserialize, Serialize};

use super::domain::{OrderContext, OrderId, PriorityScore, PriorityTier};

/// Stateless scorer that applies the triage policy to an order context.
pub struct TriageEngine {
    config: TriageConfig,
}

impl TriageEngine {
    pub fn new(config: TriageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Score one order context and classify the result. Deterministic: the
    /// same context and policy always produce the same outcome.
    pub fn score(&self, context: &OrderContext) -> TriageOutcome {
        let (components, raw_total) = rules::score_context(context, &self.config);
        let score = PriorityScore::clamped(raw_total);
        let tier = tier::classify(score, &self.config.tiers);

        TriageOutcome {
            order_id: context.order_id.clone(),
            score,
            tier,
            components,
        }
    }
}

/// Rules that can contribute points to a priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Base,
    QueueWait,
    SlaUrgency,
    ChronicCare,
    PreferredTier,
    RefillHistory,
    ControlledSubstance,
    InteractionWarning,
    OrderSize,
    AiStatus,
    AiConfidence,
}

/// Discrete contribution to a score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub score: i16,
    pub notes: String,
}

/// Scoring output: the clamped score, its tier, and the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageOutcome {
    pub order_id: OrderId,
    pub score: PriorityScore,
    pub tier: PriorityTier,
    pub components: Vec<ScoreComponent>,
}
