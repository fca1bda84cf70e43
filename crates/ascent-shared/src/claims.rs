//! Tier-Claim / XP Award Calculator.
//!
//! A submission pays out each rank tier at most once. Given the achieved
//! rank and what has already been claimed, this works out which tiers are
//! new and what they are worth.

use serde::{Deserialize, Serialize};

use crate::rank::Rank;
use crate::scale::RankScale;
use crate::tiers::ClaimedTiers;

/// Result of claiming tiers for one achieved rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierClaim {
    /// Tiers paid out by this claim, ascending
    pub new_tiers: Vec<Rank>,
    /// Sum of the flat rewards of `new_tiers`
    pub xp: u64,
    /// Previously claimed tiers plus `new_tiers`
    pub claimed: ClaimedTiers,
}

impl TierClaim {
    /// Nothing new to pay out
    pub fn is_empty(&self) -> bool {
        self.new_tiers.is_empty()
    }
}

/// Claim every unclaimed tier in `[min_rank, min(achieved, max_rank)]`.
///
/// Re-running with the returned `claimed` set and the same achieved rank
/// yields no new tiers and no XP.
pub fn claim_tiers(
    scale: &RankScale,
    achieved: Option<Rank>,
    min_rank: Rank,
    max_rank: Rank,
    claimed: &ClaimedTiers,
) -> TierClaim {
    let Some(achieved) = achieved else {
        return TierClaim {
            new_tiers: Vec::new(),
            xp: 0,
            claimed: *claimed,
        };
    };

    let top = achieved.min(max_rank);
    let new_tiers: Vec<Rank> = Rank::span(min_rank, top)
        .filter(|r| !claimed.contains(*r))
        .collect();
    let xp = new_tiers
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(scale.tier_reward(*r)));
    let updated = claimed.union(&new_tiers.iter().copied().collect());

    TierClaim {
        new_tiers,
        xp,
        claimed: updated,
    }
}

/// Whether a submission at `achieved` could still pay out anything
pub fn can_earn_more_xp(achieved: Option<Rank>, min_rank: Rank, max_rank: Rank, claimed: &ClaimedTiers) -> bool {
    match achieved {
        Some(achieved) => Rank::span(min_rank, achieved.min(max_rank)).any(|r| !claimed.contains(r)),
        None => false,
    }
}
