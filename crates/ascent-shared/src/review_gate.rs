//! Review gate: who may peer-review a pending submission.
//!
//! Pure function over the reviewer's account, their rank in the
//! submission's primary domain and the submission's achieved tier. Rules
//! are evaluated in order and the first failing rule wins. The queue
//! listing filter goes through the same function so a reviewer is never
//! shown a submission they cannot act on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::athlete::{Athlete, AthleteId};
use crate::challenge::{Challenge, ChallengeId, ChallengeSubmission};
use crate::level::{DomainLevel, LevelState};
use crate::rank::Rank;

/// Review policy knobs (config `[review]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPolicy {
    /// Minimum reviewer age in whole years
    pub adult_age: u32,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self { adult_age: 18 }
    }
}

/// Why a reviewer was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDenial {
    NotPending,
    Suspended,
    PrivilegesRevoked,
    OwnSubmission,
    NoAthleteProfile,
    Underage { adult_age: u32 },
    RankTooLow { required: Rank, tier: Rank },
}

impl fmt::Display for ReviewDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewDenial::NotPending => write!(f, "submission is not pending"),
            ReviewDenial::Suspended => write!(f, "account suspended"),
            ReviewDenial::PrivilegesRevoked => write!(f, "review privileges revoked"),
            ReviewDenial::OwnSubmission => write!(f, "cannot review own submission"),
            ReviewDenial::NoAthleteProfile => write!(f, "must have an athlete profile"),
            ReviewDenial::Underage { adult_age } => write!(f, "must be {} or older", adult_age),
            ReviewDenial::RankTooLow { required, tier } => write!(
                f,
                "requires rank {} or higher to review rank {} submissions",
                required, tier
            ),
        }
    }
}

/// Authorization result, serialized as `{ "allowed": bool, "reason"?: string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip)]
    pub denial: Option<ReviewDenial>,
}

impl ReviewDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            denial: None,
        }
    }

    pub fn deny(denial: ReviewDenial) -> Self {
        Self {
            allowed: false,
            reason: Some(denial.to_string()),
            denial: Some(denial),
        }
    }
}

/// Lowest rank letter allowed to review a submission graded `tier`
pub fn required_rank(tier: Rank) -> Rank {
    tier.next().unwrap_or(Rank::TOP)
}

/// Rank comparison alone (rules 7-8)
pub fn rank_permits(reviewer_rank: Rank, tier: Rank) -> bool {
    reviewer_rank.index() > tier.index() || (reviewer_rank.is_top() && tier.is_top())
}

/// Decide whether `reviewer` may review `submission`.
///
/// `reviewer_level` is the reviewer's level in the challenge's primary
/// domain; `None` means they have none yet and count as the lowest rank.
/// `owner_guardian` is the guardian managing the submission's owner.
pub fn evaluate_review(
    policy: &ReviewPolicy,
    reviewer: &Athlete,
    reviewer_level: Option<&LevelState>,
    submission: &ChallengeSubmission,
    owner_guardian: Option<AthleteId>,
    today: NaiveDate,
) -> ReviewDecision {
    // Decided submissions are closed to everyone, staff included
    if !submission.is_pending() {
        return ReviewDecision::deny(ReviewDenial::NotPending);
    }

    // Rule 1
    if reviewer.suspended {
        return ReviewDecision::deny(ReviewDenial::Suspended);
    }

    // Rule 2: bans do not apply to staff
    if reviewer.review_banned && !reviewer.role.is_elevated() {
        return ReviewDecision::deny(ReviewDenial::PrivilegesRevoked);
    }

    // Rule 3: staff bypass everything below
    if reviewer.role.is_elevated() {
        return ReviewDecision::allow();
    }

    // Rule 4
    if submission.athlete_id == reviewer.id || owner_guardian == Some(reviewer.id) {
        return ReviewDecision::deny(ReviewDenial::OwnSubmission);
    }

    // Rule 5
    if !reviewer.has_athlete_profile {
        return ReviewDecision::deny(ReviewDenial::NoAthleteProfile);
    }

    // Rule 6: unknown date of birth counts as under age
    let adult = reviewer
        .age_on(today)
        .is_some_and(|age| age >= policy.adult_age);
    if !adult {
        return ReviewDecision::deny(ReviewDenial::Underage {
            adult_age: policy.adult_age,
        });
    }

    // Rules 7-8
    let tier = submission.tier_or_lowest();
    let reviewer_rank = reviewer_level.map(|l| l.rank).unwrap_or(Rank::LOWEST);
    if rank_permits(reviewer_rank, tier) {
        ReviewDecision::allow()
    } else {
        tracing::debug!(
            reviewer = %reviewer.id,
            submission = %submission.id,
            reviewer_rank = %reviewer_rank,
            tier = %tier,
            "reviewer rank too low"
        );
        ReviewDecision::deny(ReviewDenial::RankTooLow {
            required: required_rank(tier),
            tier,
        })
    }
}

/// Reviewer's level in the primary domain of `challenge`, if any
pub fn reviewer_level_for<'a>(
    levels: &'a [DomainLevel],
    reviewer_id: AthleteId,
    challenge: &Challenge,
) -> Option<&'a LevelState> {
    let domain = challenge.primary_domain();
    levels
        .iter()
        .find(|l| l.athlete_id == reviewer_id && &l.domain == domain)
        .map(|l| &l.state)
}

/// Pending submissions `reviewer` is allowed to review.
///
/// Submissions whose challenge is unknown are left out.
pub fn reviewable_submissions<'a>(
    policy: &ReviewPolicy,
    reviewer: &Athlete,
    levels: &[DomainLevel],
    submissions: &'a [ChallengeSubmission],
    challenges: &HashMap<ChallengeId, Challenge>,
    athletes: &HashMap<AthleteId, Athlete>,
    today: NaiveDate,
) -> Vec<&'a ChallengeSubmission> {
    submissions
        .iter()
        .filter(|s| {
            let Some(challenge) = challenges.get(&s.challenge_id) else {
                return false;
            };
            let level = reviewer_level_for(levels, reviewer.id, challenge);
            let guardian = athletes.get(&s.athlete_id).and_then(|a| a.guardian_id);
            evaluate_review(policy, reviewer, level, s, guardian, today).allowed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athlete::Role;
    use crate::scale::RankScale;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn adult(n: u128) -> Athlete {
        Athlete::new(Uuid::from_u128(n), "Reviewer").born(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
    }

    fn graded(tier: Option<Rank>) -> ChallengeSubmission {
        let mut sub = ChallengeSubmission::new(Uuid::from_u128(50), Uuid::from_u128(99), Uuid::from_u128(7), 1.0);
        sub.achieved_rank = tier;
        sub
    }

    fn at(rank: Rank) -> LevelState {
        let scale = RankScale::default();
        LevelState::from_total(&scale, scale.reach(rank))
    }

    fn check(reviewer: &Athlete, level: Option<&LevelState>, sub: &ChallengeSubmission) -> ReviewDecision {
        evaluate_review(&ReviewPolicy::default(), reviewer, level, sub, None, today())
    }

    #[test]
    fn test_suspended_first() {
        let mut reviewer = adult(1).with_role(Role::Admin);
        reviewer.suspended = true;
        let decision = check(&reviewer, None, &graded(None));
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("account suspended"));
    }

    #[test]
    fn test_ban_ignored_for_elevated() {
        let mut reviewer = adult(1);
        reviewer.review_banned = true;
        assert_eq!(check(&reviewer, None, &graded(None)).denial, Some(ReviewDenial::PrivilegesRevoked));

        let coach = {
            let mut c = adult(1).with_role(Role::Coach);
            c.review_banned = true;
            c
        };
        assert!(check(&coach, None, &graded(Some(Rank::S))).allowed);
    }

    #[test]
    fn test_elevated_bypasses_everything() {
        // Owner, no profile, no birthday, rank F: staff still allowed
        let mut admin = Athlete::new(Uuid::from_u128(99), "Admin").with_role(Role::Admin);
        admin.has_athlete_profile = false;
        assert!(check(&admin, None, &graded(Some(Rank::A))).allowed);
    }

    #[test]
    fn test_own_and_guardian() {
        let owner = adult(99);
        assert_eq!(check(&owner, None, &graded(None)).denial, Some(ReviewDenial::OwnSubmission));

        let guardian = adult(5);
        let decision = evaluate_review(
            &ReviewPolicy::default(),
            &guardian,
            Some(&at(Rank::S)),
            &graded(None),
            Some(guardian.id),
            today(),
        );
        assert_eq!(decision.reason.as_deref(), Some("cannot review own submission"));
    }

    #[test]
    fn test_profile_and_age() {
        let mut no_profile = adult(1);
        no_profile.has_athlete_profile = false;
        assert_eq!(check(&no_profile, None, &graded(None)).denial, Some(ReviewDenial::NoAthleteProfile));

        let minor = Athlete::new(Uuid::from_u128(2), "Kid").born(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        let decision = check(&minor, Some(&at(Rank::S)), &graded(None));
        assert_eq!(decision.reason.as_deref(), Some("must be 18 or older"));

        let unknown = Athlete::new(Uuid::from_u128(3), "Anon");
        assert!(!check(&unknown, Some(&at(Rank::S)), &graded(None)).allowed);
    }

    #[test]
    fn test_rank_one_letter_above() {
        let reviewer = adult(1);
        let decision = check(&reviewer, Some(&at(Rank::C)), &graded(Some(Rank::C)));
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("requires rank B or higher to review rank C submissions")
        );
        assert!(check(&reviewer, Some(&at(Rank::B)), &graded(Some(Rank::C))).allowed);
        assert!(check(&reviewer, Some(&at(Rank::S)), &graded(Some(Rank::C))).allowed);
    }

    #[test]
    fn test_ungraded_counts_as_lowest() {
        let reviewer = adult(1);
        assert!(!check(&reviewer, None, &graded(None)).allowed);
        assert!(check(&reviewer, Some(&at(Rank::E)), &graded(None)).allowed);
    }

    #[test]
    fn test_top_rank_special_case() {
        let reviewer = adult(1);
        assert!(check(&reviewer, Some(&at(Rank::S)), &graded(Some(Rank::S))).allowed);
        let decision = check(&reviewer, Some(&at(Rank::A)), &graded(Some(Rank::S)));
        assert_eq!(
            decision.reason.as_deref(),
            Some("requires rank S or higher to review rank S submissions")
        );
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_string(&ReviewDecision::allow()).unwrap();
        assert_eq!(json, r#"{"allowed":true}"#);
        let json = serde_json::to_string(&ReviewDecision::deny(ReviewDenial::Suspended)).unwrap();
        assert_eq!(json, r#"{"allowed":false,"reason":"account suspended"}"#);
    }
}
