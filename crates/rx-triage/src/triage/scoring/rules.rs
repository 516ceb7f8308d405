use super::config::TriageConfig;
use super::{ScoreComponent, ScoreFactor};
use crate::triage::domain::{AiVerificationStatus, OrderContext};

/// Apply the additive rubric to a context, returning one audit component per
/// applied rule plus the raw (unclamped) point total.
pub(crate) fn score_context(
    context: &OrderContext,
    config: &TriageConfig,
) -> (Vec<ScoreComponent>, i16) {
    let mut components = Vec::new();
    let mut total: i16 = 0;

    components.push(ScoreComponent {
        factor: ScoreFactor::Base,
        score: config.base_score,
        notes: "base priority for every active order".to_string(),
    });
    total += config.base_score;

    let wait_points = wait_points(context.minutes_in_queue, config);
    if wait_points > 0 {
        let capped = wait_points >= config.max_wait_points;
        components.push(ScoreComponent {
            factor: ScoreFactor::QueueWait,
            score: wait_points,
            notes: if capped {
                format!(
                    "{} min in queue reaches the {}-point wait cap",
                    context.minutes_in_queue, config.max_wait_points
                )
            } else {
                format!(
                    "{} min in queue ({} min per point)",
                    context.minutes_in_queue, config.minutes_per_wait_point
                )
            },
        });
        total += wait_points;
    }

    if let Some(minutes) = context.minutes_to_breach {
        let bonus = config.sla_bonus.bonus_for(minutes);
        components.push(ScoreComponent {
            factor: ScoreFactor::SlaUrgency,
            score: bonus,
            notes: if minutes < 0 {
                format!("promised delivery breached {} min ago", -minutes)
            } else {
                format!("{minutes} min until promised delivery")
            },
        });
        total += bonus;
    }

    if context.patient.is_chronic {
        components.push(ScoreComponent {
            factor: ScoreFactor::ChronicCare,
            score: config.chronic_bonus,
            notes: "chronic-care patient".to_string(),
        });
        total += config.chronic_bonus;
    }

    if context.patient.is_preferred_tier {
        components.push(ScoreComponent {
            factor: ScoreFactor::PreferredTier,
            score: config.preferred_tier_bonus,
            notes: "preferred-tier patient".to_string(),
        });
        total += config.preferred_tier_bonus;
    }

    if context.patient.has_refill_history {
        components.push(ScoreComponent {
            factor: ScoreFactor::RefillHistory,
            score: config.refill_history_bonus,
            notes: "established refill history".to_string(),
        });
        total += config.refill_history_bonus;
    }

    if context.order.has_controlled_substance {
        components.push(ScoreComponent {
            factor: ScoreFactor::ControlledSubstance,
            score: config.controlled_substance_bonus,
            notes: "controlled substance requires special handling".to_string(),
        });
        total += config.controlled_substance_bonus;
    }

    if context.order.has_interaction_warning {
        components.push(ScoreComponent {
            factor: ScoreFactor::InteractionWarning,
            score: -config.interaction_warning_penalty,
            notes: "interaction warning present, allow time for careful review".to_string(),
        });
        total -= config.interaction_warning_penalty;
    }

    if context.order.item_count > config.large_order_threshold {
        components.push(ScoreComponent {
            factor: ScoreFactor::OrderSize,
            score: config.large_order_bonus,
            notes: format!(
                "{} items exceeds the {}-item threshold",
                context.order.item_count, config.large_order_threshold
            ),
        });
        total += config.large_order_bonus;
    }

    match context.ai.status {
        AiVerificationStatus::NeedsReview => {
            components.push(ScoreComponent {
                factor: ScoreFactor::AiStatus,
                score: config.needs_review_bonus,
                notes: "AI verification needs pharmacist review".to_string(),
            });
            total += config.needs_review_bonus;
        }
        AiVerificationStatus::Rejected => {
            components.push(ScoreComponent {
                factor: ScoreFactor::AiStatus,
                score: -config.rejected_penalty,
                notes: "AI rejected the prescription, order unlikely to proceed".to_string(),
            });
            total -= config.rejected_penalty;
        }
        AiVerificationStatus::Approved => {}
    }

    if context.ai.status != AiVerificationStatus::Rejected
        && context.ai.confidence < config.low_confidence_threshold
    {
        components.push(ScoreComponent {
            factor: ScoreFactor::AiConfidence,
            score: config.low_confidence_bonus,
            notes: format!(
                "AI confidence {:.2} below {:.2}",
                context.ai.confidence, config.low_confidence_threshold
            ),
        });
        total += config.low_confidence_bonus;
    }

    (components, total)
}

fn wait_points(minutes_in_queue: i64, config: &TriageConfig) -> i16 {
    if config.minutes_per_wait_point <= 0 {
        return 0;
    }

    let points = minutes_in_queue.max(0) / config.minutes_per_wait_point;
    points.min(config.max_wait_points as i64) as i16
}
