//! Ordering and grouping of scored orders for stable presentation.

use std::collections::BTreeMap;

use super::domain::PriorityTier;
use super::scoring::TriageOutcome;

/// Sort outcomes by descending score. The sort is stable: equal-score orders
/// keep their input order, so operators never see unexplained reshuffling of
/// ties between refreshes.
pub fn sort_by_priority(mut outcomes: Vec<TriageOutcome>) -> Vec<TriageOutcome> {
    outcomes.sort_by(|a, b| b.score.cmp(&a.score));
    outcomes
}

/// Partition outcomes into the four tiers, each partition sorted by
/// [`sort_by_priority`]. Every input appears in exactly one partition and all
/// four tiers are present, so iterating the map walks critical through low
/// with no gaps.
pub fn group_by_tier(outcomes: Vec<TriageOutcome>) -> BTreeMap<PriorityTier, Vec<TriageOutcome>> {
    let mut groups: BTreeMap<PriorityTier, Vec<TriageOutcome>> = PriorityTier::ordered()
        .into_iter()
        .map(|tier| (tier, Vec::new()))
        .collect();

    for outcome in sort_by_priority(outcomes) {
        groups
            .entry(outcome.tier)
            .or_default()
            .push(outcome);
    }

    groups
}
