//! Level State Machine.
//!
//! Tracks one athlete's standing in one domain: total XP, rank letter,
//! sublevel (0-9), banked XP and breakthrough readiness.
//!
//! ## Transitions
//!
//! - `apply_xp`: XP raises the sublevel within the current rank. XP that
//!   would carry the athlete into the next rank letter pins the sublevel
//!   at 9 and is banked instead.
//! - `breakthrough`: the only way the rank letter goes up. Needs a full
//!   bank (`breakthrough_ready`) and an external qualification.
//! - `reverse_xp`: subtracts XP and re-derives standing from the
//!   cumulative table. May demote, never promotes.
//! - `from_total`: flattens a total into a fresh state (reconciliation).
//!
//! Every transition is a pure `(old, delta) -> new` function; persistence
//! belongs to the caller.

use serde::{Deserialize, Serialize};

use crate::athlete::AthleteId;
use crate::breakthrough::Qualification;
use crate::domain::Domain;
use crate::error::{AscentError, Result};
use crate::rank::{to_numeric, Rank, MAX_SUBLEVEL};
use crate::scale::RankScale;

/// Mutable progression tuple for one (athlete, domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    /// Total XP earned in the domain
    pub current_xp: u64,
    pub rank: Rank,
    pub sublevel: u8,
    /// XP past the current rank's cap, held until a breakthrough
    pub banked_xp: u64,
    pub breakthrough_ready: bool,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            current_xp: 0,
            rank: Rank::LOWEST,
            sublevel: 0,
            banked_xp: 0,
            breakthrough_ready: false,
        }
    }
}

impl LevelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a total into the standing the cumulative table implies.
    /// Banked XP starts empty.
    pub fn from_total(scale: &RankScale, total_xp: u64) -> Self {
        let (rank, sublevel) = scale.locate(total_xp);
        Self {
            current_xp: total_xp,
            rank,
            sublevel,
            banked_xp: 0,
            breakthrough_ready: sublevel == MAX_SUBLEVEL && total_xp >= scale.cap(rank),
        }
    }

    pub fn numeric_level(&self) -> u8 {
        to_numeric(self.rank, self.sublevel)
    }

    /// Check the record invariants; a failure means a corrupted record
    pub fn validate(&self) -> Result<()> {
        if self.sublevel > MAX_SUBLEVEL {
            return Err(AscentError::InvalidSublevel(self.sublevel));
        }
        if self.breakthrough_ready && self.sublevel != MAX_SUBLEVEL {
            return Err(AscentError::InvalidSublevel(self.sublevel));
        }
        Ok(())
    }

    /// Add XP. The rank letter never changes here.
    pub fn apply_xp(&self, scale: &RankScale, amount: u64) -> LevelTransition {
        let xp = self.current_xp.saturating_add(amount);
        let cap = scale.cap(self.rank);
        let (candidate_rank, candidate_sublevel) = scale.locate(xp);

        let mut next = *self;
        next.current_xp = xp;

        if candidate_rank > self.rank || xp >= cap {
            // Would cross into the next letter: pin and bank the excess
            next.sublevel = MAX_SUBLEVEL;
            next.banked_xp = xp.saturating_sub(cap);
        } else if candidate_rank == self.rank && candidate_sublevel > self.sublevel {
            next.sublevel = candidate_sublevel;
        }
        next.breakthrough_ready = next.sublevel == MAX_SUBLEVEL && xp >= cap;

        let transition = LevelTransition::new(TransitionKind::Award, amount, *self, next);
        tracing::debug!(
            amount,
            from = %transition.before.label(),
            to = %transition.after.label(),
            banked = next.banked_xp,
            ready = next.breakthrough_ready,
            "applied xp"
        );
        transition
    }

    /// Remove XP (floored at zero) and re-derive standing from the
    /// cumulative table, clamped to the current rank letter.
    pub fn reverse_xp(&self, scale: &RankScale, amount: u64) -> LevelTransition {
        let xp = self.current_xp.saturating_sub(amount);
        let (rank, sublevel) = scale.locate_capped(xp, self.rank);
        let cap = scale.cap(rank);

        let next = LevelState {
            current_xp: xp,
            rank,
            sublevel,
            banked_xp: xp.saturating_sub(cap),
            breakthrough_ready: sublevel == MAX_SUBLEVEL && xp >= cap,
        };

        let transition = LevelTransition::new(TransitionKind::Reversal, amount, *self, next);
        tracing::debug!(
            amount,
            from = %transition.before.label(),
            to = %transition.after.label(),
            "reversed xp"
        );
        transition
    }

    /// Promote to the next rank letter if ready and qualified.
    ///
    /// Banked XP carries forward as progress inside the new rank: total XP
    /// is unchanged, the sublevel restarts at 0 and the bank empties.
    pub fn breakthrough(&self, qualification: &Qualification) -> BreakthroughOutcome {
        if !self.breakthrough_ready {
            return BreakthroughOutcome::NotReady;
        }
        let Some(next_rank) = self.rank.next() else {
            return BreakthroughOutcome::NoHigherRank;
        };
        if !qualification.is_qualified() {
            return BreakthroughOutcome::NotQualified {
                reason: qualification.describe(),
            };
        }

        let promoted = LevelState {
            current_xp: self.current_xp,
            rank: next_rank,
            sublevel: 0,
            banked_xp: 0,
            breakthrough_ready: false,
        };
        tracing::info!(
            from = %self.rank,
            to = %next_rank,
            carried_xp = self.banked_xp,
            "breakthrough"
        );
        BreakthroughOutcome::Promoted {
            from: self.rank,
            to: next_rank,
            carried_xp: self.banked_xp,
            state: promoted,
        }
    }

    /// Progress through the current sublevel (0.0 - 1.0)
    pub fn progress_to_next(&self, scale: &RankScale) -> f64 {
        if self.breakthrough_ready {
            return 1.0;
        }
        let start = scale.xp_at(self.rank, self.sublevel);
        let span = scale.xp_per_sublevel(self.rank);
        if span == 0 {
            return 1.0;
        }
        let progress = self.current_xp.saturating_sub(start) as f64 / span as f64;
        progress.clamp(0.0, 1.0)
    }

    /// Short form like "E7"
    pub fn label(&self) -> String {
        format!("{}{}", self.rank, self.sublevel)
    }
}

/// Persisted per-(athlete, domain) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainLevel {
    pub athlete_id: AthleteId,
    pub domain: Domain,
    #[serde(flatten)]
    pub state: LevelState,
}

impl DomainLevel {
    pub fn new(athlete_id: AthleteId, domain: Domain, state: LevelState) -> Self {
        Self {
            athlete_id,
            domain,
            state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Award,
    Reversal,
}

/// Before/after pair for one XP change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTransition {
    pub kind: TransitionKind,
    pub amount: u64,
    pub before: LevelState,
    pub after: LevelState,
}

impl LevelTransition {
    fn new(kind: TransitionKind, amount: u64, before: LevelState, after: LevelState) -> Self {
        Self {
            kind,
            amount,
            before,
            after,
        }
    }

    pub fn rank_changed(&self) -> bool {
        self.before.rank != self.after.rank
    }

    pub fn sublevels_gained(&self) -> i32 {
        self.after.numeric_level() as i32 - self.before.numeric_level() as i32
    }

    /// Became breakthrough-ready with this change
    pub fn newly_ready(&self) -> bool {
        !self.before.breakthrough_ready && self.after.breakthrough_ready
    }

    pub fn banked_delta(&self) -> i64 {
        self.after.banked_xp as i64 - self.before.banked_xp as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BreakthroughOutcome {
    Promoted {
        from: Rank,
        to: Rank,
        carried_xp: u64,
        state: LevelState,
    },
    NotReady,
    NotQualified {
        reason: String,
    },
    /// Top rank: nothing above, XP keeps banking
    NoHigherRank,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakthrough::BreakthroughRule;

    fn qualified() -> Qualification {
        Qualification::Qualified {
            rule: BreakthroughRule {
                domain: Domain::new("strength"),
                division: None,
                from_rank: Rank::E,
                to_rank: Rank::D,
                tier_required: Rank::D,
                challenge_count: 1,
            },
            challenges_met: 1,
        }
    }

    fn at(scale: &RankScale, rank: Rank, sublevel: u8, extra: u64) -> LevelState {
        LevelState {
            current_xp: scale.xp_at(rank, sublevel) + extra,
            rank,
            sublevel,
            banked_xp: 0,
            breakthrough_ready: false,
        }
    }

    #[test]
    fn test_normal_progression() {
        let scale = RankScale::default();
        let t = LevelState::new().apply_xp(&scale, 350);
        assert_eq!(t.after.rank, Rank::F);
        assert_eq!(t.after.sublevel, 3);
        assert_eq!(t.after.current_xp, 350);
        assert!(!t.after.breakthrough_ready);
        assert_eq!(t.sublevels_gained(), 3);
    }

    #[test]
    fn test_sublevel_nine_without_full_bank_is_not_ready() {
        let scale = RankScale::default();
        let t = LevelState::new().apply_xp(&scale, 950);
        assert_eq!(t.after.sublevel, 9);
        assert!(!t.after.breakthrough_ready);
        assert_eq!(t.after.banked_xp, 0);
    }

    #[test]
    fn test_overflow_banks_instead_of_promoting() {
        let scale = RankScale::default();
        let t = LevelState::new().apply_xp(&scale, 1_400);
        assert_eq!(t.after.rank, Rank::F);
        assert_eq!(t.after.sublevel, 9);
        assert_eq!(t.after.banked_xp, 400);
        assert!(t.after.breakthrough_ready);
        assert!(t.newly_ready());
        assert!(!t.rank_changed());
    }

    #[test]
    fn test_exactly_at_cap_is_ready_with_empty_bank() {
        let scale = RankScale::default();
        let t = LevelState::new().apply_xp(&scale, 1_000);
        assert_eq!(t.after.sublevel, 9);
        assert_eq!(t.after.banked_xp, 0);
        assert!(t.after.breakthrough_ready);
    }

    #[test]
    fn test_banked_rank_keeps_banking() {
        let scale = RankScale::default();
        let state = LevelState {
            current_xp: scale.cap(Rank::E) + 50,
            rank: Rank::E,
            sublevel: 9,
            banked_xp: 50,
            breakthrough_ready: true,
        };
        let t = state.apply_xp(&scale, 500);
        assert_eq!(t.after.rank, Rank::E);
        assert_eq!(t.after.sublevel, 9);
        assert_eq!(t.after.banked_xp, 550);
        assert!(t.after.breakthrough_ready);
        assert_eq!(t.banked_delta(), 500);
    }

    #[test]
    fn test_huge_award_never_skips_letters() {
        let scale = RankScale::default();
        let t = LevelState::new().apply_xp(&scale, 1_000_000);
        assert_eq!(t.after.rank, Rank::F);
        assert_eq!(t.after.sublevel, 9);
        assert_eq!(t.after.banked_xp, 999_000);
    }

    #[test]
    fn test_positive_award_never_lowers_numeric_level() {
        let scale = RankScale::default();
        let mut state = LevelState::new();
        for amount in [0u64, 1, 99, 250, 3, 700, 5_000, 10, 40_000] {
            let t = state.apply_xp(&scale, amount);
            assert!(t.after.numeric_level() >= t.before.numeric_level());
            assert_eq!(t.after.rank, Rank::F);
            t.after.validate().unwrap();
            state = t.after;
        }
    }

    #[test]
    fn test_breakthrough_promotes_and_carries_bank() {
        let scale = RankScale::default();
        let ready = LevelState::new().apply_xp(&scale, 1_150).after;
        match ready.breakthrough(&qualified()) {
            BreakthroughOutcome::Promoted { from, to, carried_xp, state } => {
                assert_eq!(from, Rank::F);
                assert_eq!(to, Rank::E);
                assert_eq!(carried_xp, 150);
                assert_eq!(state.rank, Rank::E);
                assert_eq!(state.sublevel, 0);
                assert_eq!(state.banked_xp, 0);
                assert!(!state.breakthrough_ready);
                assert_eq!(state.current_xp, 1_150);

                // Carried XP counts toward the new rank on the next award
                let next = state.apply_xp(&scale, 50).after;
                assert_eq!(next.rank, Rank::E);
                assert_eq!(next.sublevel, 1);
            }
            other => panic!("expected promotion, got {:?}", other),
        }
    }

    #[test]
    fn test_breakthrough_requires_ready() {
        let scale = RankScale::default();
        let state = LevelState::new().apply_xp(&scale, 500).after;
        assert_eq!(state.breakthrough(&qualified()), BreakthroughOutcome::NotReady);
    }

    #[test]
    fn test_breakthrough_requires_qualification() {
        let scale = RankScale::default();
        let ready = LevelState::new().apply_xp(&scale, 1_000).after;
        match ready.breakthrough(&Qualification::NoRule) {
            BreakthroughOutcome::NotQualified { reason } => {
                assert!(reason.contains("no breakthrough rule"))
            }
            other => panic!("expected NotQualified, got {:?}", other),
        }
    }

    #[test]
    fn test_top_rank_breakthrough_is_noop() {
        let scale = RankScale::default();
        let top = at(&scale, Rank::S, 9, 0).apply_xp(&scale, 70_000).after;
        assert!(top.breakthrough_ready);
        assert_eq!(top.rank, Rank::S);
        assert!(top.banked_xp > 0);
        assert_eq!(top.breakthrough(&qualified()), BreakthroughOutcome::NoHigherRank);
    }

    #[test]
    fn test_reversal_floors_at_zero() {
        let scale = RankScale::default();
        let state = LevelState::new().apply_xp(&scale, 300).after;
        let t = state.reverse_xp(&scale, 1_000);
        assert_eq!(t.after, LevelState::new());
    }

    #[test]
    fn test_reversal_unbanks_and_clears_ready() {
        let scale = RankScale::default();
        let state = LevelState::new().apply_xp(&scale, 1_200).after;
        let t = state.reverse_xp(&scale, 300);
        assert_eq!(t.after.current_xp, 900);
        assert_eq!(t.after.rank, Rank::F);
        assert_eq!(t.after.sublevel, 9);
        assert_eq!(t.after.banked_xp, 0);
        assert!(!t.after.breakthrough_ready);
    }

    #[test]
    fn test_reversal_can_demote_but_never_promotes() {
        let scale = RankScale::default();
        // Post-breakthrough at E0 with 1,200 total XP
        let state = at(&scale, Rank::E, 0, 200);
        let down = state.reverse_xp(&scale, 500);
        assert_eq!(down.after.rank, Rank::F);
        assert_eq!(down.after.sublevel, 7);
        assert!(down.rank_changed());

        // F-rank record holding far more XP than F allows stays at F
        let heavy = LevelState {
            current_xp: 50_000,
            rank: Rank::F,
            sublevel: 9,
            banked_xp: 49_000,
            breakthrough_ready: true,
        };
        let t = heavy.reverse_xp(&scale, 10);
        assert_eq!(t.after.rank, Rank::F);
        assert_eq!(t.after.banked_xp, 48_990);
        assert!(t.after.breakthrough_ready);
    }

    #[test]
    fn test_from_total_flattens() {
        let scale = RankScale::default();
        let state = LevelState::from_total(&scale, 3_500);
        assert_eq!(state.rank, Rank::D);
        assert_eq!(state.sublevel, 1);
        assert_eq!(state.banked_xp, 0);
        assert!(!state.breakthrough_ready);
    }

    #[test]
    fn test_validate_catches_corruption() {
        let mut state = LevelState::new();
        state.sublevel = 12;
        assert!(state.validate().is_err());
        let mut state = LevelState::new();
        state.breakthrough_ready = true;
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_progress_to_next() {
        let scale = RankScale::default();
        let state = LevelState::new().apply_xp(&scale, 250).after;
        assert!((state.progress_to_next(&scale) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_domain_level_flattens_state_in_json() {
        let level = DomainLevel::new(uuid::Uuid::nil(), Domain::new("strength"), LevelState::new());
        let json = serde_json::to_value(&level).unwrap();
        assert_eq!(json["rank"], "F");
        assert_eq!(json["current_xp"], 0);
        let parsed: DomainLevel = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, level);
    }
}
