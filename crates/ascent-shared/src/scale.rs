//! Rank Scale: XP cost tables for the progression curve.
//!
//! ## XP Curve
//!
//! Each rank has ten sublevels. The XP cost of one sublevel doubles with
//! every rank letter, so the default curve is:
//!
//! - F: 100 XP per sublevel, reached at 0 XP
//! - E: 200 XP per sublevel, reached at 1,000 XP
//! - D: 400 XP per sublevel, reached at 3,000 XP
//! - ...
//! - S: 6,400 XP per sublevel, reached at 63,000 XP
//!
//! A rank's cap is the XP at which its sublevel 9 is "full", which for every
//! rank but the top equals the reach threshold of the next rank.
//!
//! The scale is passed into every engine call so alternate curves can be
//! configured and tested.

use serde::{Deserialize, Serialize};

use crate::error::{AscentError, Result};
use crate::rank::{Rank, MAX_SUBLEVEL, RANK_COUNT};

const SUBLEVELS_PER_RANK: u64 = MAX_SUBLEVEL as u64 + 1;

/// Immutable progression curve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankScale {
    /// XP cost of one sublevel, indexed by rank (F first)
    pub xp_per_sublevel: [u64; RANK_COUNT],
    /// Flat XP paid for claiming a challenge tier of each rank
    pub tier_rewards: [u64; RANK_COUNT],
}

impl Default for RankScale {
    fn default() -> Self {
        Self::from_base(100, [25, 50, 75, 100, 150, 200, 300])
    }
}

impl RankScale {
    /// Build a doubling curve from the F-rank sublevel cost
    pub fn from_base(base_per_sublevel: u64, tier_rewards: [u64; RANK_COUNT]) -> Self {
        let mut xp_per_sublevel = [0u64; RANK_COUNT];
        for (i, slot) in xp_per_sublevel.iter_mut().enumerate() {
            *slot = base_per_sublevel.saturating_mul(1u64 << i);
        }
        Self {
            xp_per_sublevel,
            tier_rewards,
        }
    }

    /// Reject curves the level lookup cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.xp_per_sublevel.iter().any(|&xp| xp == 0) {
            return Err(AscentError::InvalidScale(
                "xp_per_sublevel entries must be non-zero".to_string(),
            ));
        }
        if self.xp_per_sublevel.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AscentError::InvalidScale(
                "xp_per_sublevel must strictly increase with rank".to_string(),
            ));
        }
        Ok(())
    }

    pub fn xp_per_sublevel(&self, rank: Rank) -> u64 {
        self.xp_per_sublevel[rank.index()]
    }

    /// Flat reward for claiming one tier of this rank
    pub fn tier_reward(&self, rank: Rank) -> u64 {
        self.tier_rewards[rank.index()]
    }

    /// Total XP required to reach sublevel 0 of `rank`
    pub fn reach(&self, rank: Rank) -> u64 {
        self.xp_per_sublevel[..rank.index()]
            .iter()
            .fold(0u64, |acc, per| acc.saturating_add(per.saturating_mul(SUBLEVELS_PER_RANK)))
    }

    /// Total XP at which `rank` is full (sublevel 9 completed)
    pub fn cap(&self, rank: Rank) -> u64 {
        self.reach(rank)
            .saturating_add(self.xp_per_sublevel(rank).saturating_mul(SUBLEVELS_PER_RANK))
    }

    /// Rank and sublevel implied by a total XP value, from the cumulative table
    pub fn locate(&self, total_xp: u64) -> (Rank, u8) {
        let rank = Rank::ALL
            .iter()
            .rev()
            .copied()
            .find(|r| self.reach(*r) <= total_xp)
            .unwrap_or(Rank::LOWEST);
        let within = total_xp - self.reach(rank);
        let sublevel = (within / self.xp_per_sublevel(rank).max(1)).min(MAX_SUBLEVEL as u64) as u8;
        (rank, sublevel)
    }

    /// Like `locate`, but never reports a rank above `ceiling`.
    /// XP past the ceiling's cap pins the result at (ceiling, 9).
    pub fn locate_capped(&self, total_xp: u64, ceiling: Rank) -> (Rank, u8) {
        let (rank, sublevel) = self.locate(total_xp);
        if rank > ceiling {
            (ceiling, MAX_SUBLEVEL)
        } else {
            (rank, sublevel)
        }
    }

    /// Total XP at which a given (rank, sublevel) begins
    pub fn xp_at(&self, rank: Rank, sublevel: u8) -> u64 {
        self.reach(rank).saturating_add(
            self.xp_per_sublevel(rank)
                .saturating_mul(sublevel.min(MAX_SUBLEVEL) as u64),
        )
    }
}
