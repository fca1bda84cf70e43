//! Progression engine shared by the Ascent tools.
//!
//! Turns graded challenge performances into rank tiers and XP, advances
//! per-domain levels (with banked overflow and gated breakthroughs),
//! reverses and reconciles XP, and decides who may peer-review what.
//! Everything except `config` and `snapshot` is pure computation.

pub mod athlete;
pub mod award;
pub mod breakthrough;
pub mod challenge;
pub mod claims;
pub mod config;
pub mod domain;
pub mod error;
pub mod grading;
pub mod ledger;
pub mod level;
pub mod rank;
pub mod reconcile;
pub mod review_gate;
pub mod reversal;
pub mod scale;
pub mod snapshot;
pub mod tiers;

pub use athlete::{Athlete, AthleteId, Role};
pub use award::{award_submission, AwardOutcome, DomainAward};
pub use breakthrough::{qualify, BreakthroughRule, Qualification};
pub use challenge::{Challenge, ChallengeId, ChallengeSubmission, SubmissionId, SubmissionStatus};
pub use claims::{can_earn_more_xp, claim_tiers, TierClaim};
pub use config::EngineConfig;
pub use domain::{Domain, DomainShare, XpSplit};
pub use error::{AscentError, Result};
pub use grading::{resolve_tier, ChallengeGrade, Division, Gender};
pub use ledger::{XpLedger, XpSource, XpTransaction};
pub use level::{BreakthroughOutcome, DomainLevel, LevelState, LevelTransition, TransitionKind};
pub use rank::{from_numeric, to_numeric, Rank, MAX_SUBLEVEL};
pub use reconcile::ReconcilePlan;
pub use review_gate::{evaluate_review, ReviewDecision, ReviewDenial, ReviewPolicy};
pub use reversal::{reverse_submission, ReversalOutcome};
pub use scale::RankScale;
pub use snapshot::{BreakthroughAttempt, Snapshot, SNAPSHOT_PATH};
pub use tiers::ClaimedTiers;

/// Version of the engine crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
