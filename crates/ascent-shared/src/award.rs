//! Award pipeline: measurement -> tier -> claim -> XP split -> level changes.
//!
//! Pure. Produces everything the caller must write in one transaction:
//! the submission's new grading fields, the per-domain level states and
//! the ledger rows. A resubmission that claims nothing new is a no-op
//! outcome, not an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::athlete::{Athlete, AthleteId};
use crate::challenge::{Challenge, ChallengeSubmission, SubmissionId};
use crate::claims::{claim_tiers, TierClaim};
use crate::domain::Domain;
use crate::grading::resolve_tier;
use crate::ledger::{XpSource, XpTransaction};
use crate::level::{DomainLevel, LevelState, LevelTransition};
use crate::rank::Rank;
use crate::scale::RankScale;

/// XP applied to one domain by an award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAward {
    pub domain: Domain,
    pub xp: u64,
    /// True when the athlete had no level in this domain yet
    pub created: bool,
    pub transition: LevelTransition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub submission_id: SubmissionId,
    pub athlete_id: AthleteId,
    pub division: Option<String>,
    pub achieved_rank: Option<Rank>,
    pub claim: TierClaim,
    /// Sum of per-grade bonuses for the newly claimed tiers
    pub bonus_xp: u64,
    /// XP granted by this award (tier rewards plus bonuses)
    pub xp_granted: u64,
    /// Submission's lifetime `xp_awarded` after this award
    pub xp_awarded_total: u64,
    pub domains: Vec<DomainAward>,
    pub transactions: Vec<XpTransaction>,
}

impl AwardOutcome {
    /// Nothing new was claimed
    pub fn is_noop(&self) -> bool {
        self.claim.is_empty()
    }

    /// Submission with grading fields updated
    pub fn apply_to(&self, submission: &ChallengeSubmission) -> ChallengeSubmission {
        let mut updated = submission.clone();
        updated.achieved_rank = self.achieved_rank;
        updated.claimed_tiers = self.claim.claimed;
        updated.xp_awarded = self.xp_awarded_total;
        updated
    }

    /// Level records to upsert
    pub fn level_records(&self) -> Vec<DomainLevel> {
        self.domains
            .iter()
            .map(|d| DomainLevel::new(self.athlete_id, d.domain.clone(), d.transition.after))
            .collect()
    }
}

/// Grade a submission and work out what it earns.
///
/// `levels` are the athlete's current domain levels; missing domains start
/// from a zero baseline.
pub fn award_submission(
    scale: &RankScale,
    challenge: &Challenge,
    athlete: &Athlete,
    submission: &ChallengeSubmission,
    levels: &[DomainLevel],
    today: NaiveDate,
) -> AwardOutcome {
    let age = athlete.age_on(today);
    let division = challenge
        .division_for(athlete.gender, age)
        .map(|d| d.name.clone());
    let bars = challenge.bars_for(athlete.gender, age);
    let achieved = resolve_tier(submission.achieved_value, &bars, challenge.lower_is_better);

    let claim = claim_tiers(
        scale,
        achieved,
        challenge.min_rank,
        challenge.max_rank,
        &submission.claimed_tiers,
    );
    let bonus_xp: u64 = match &division {
        Some(name) => claim
            .new_tiers
            .iter()
            .map(|r| challenge.bonus_for(name, *r))
            .sum(),
        None => 0,
    };
    let xp_granted = claim.xp.saturating_add(bonus_xp);

    let mut domains = Vec::new();
    let mut transactions = Vec::new();
    if xp_granted > 0 {
        let note = format!("{}: tiers {}", challenge.name, tier_list(&claim.new_tiers));
        for (domain, xp) in challenge.split.distribute(xp_granted) {
            let existing = levels
                .iter()
                .find(|l| l.athlete_id == athlete.id && l.domain == domain);
            let before = existing.map(|l| l.state).unwrap_or_else(LevelState::new);
            let transition = before.apply_xp(scale, xp);

            transactions.push(
                XpTransaction::new(athlete.id, domain.clone(), xp, XpSource::Challenge, submission.id)
                    .with_note(note.clone()),
            );
            domains.push(DomainAward {
                domain,
                xp,
                created: existing.is_none(),
                transition,
            });
        }
    }

    if claim.is_empty() {
        tracing::debug!(
            submission = %submission.id,
            achieved = ?achieved,
            "no new tiers to claim"
        );
    } else {
        tracing::info!(
            submission = %submission.id,
            athlete = %athlete.id,
            tiers = %tier_list(&claim.new_tiers),
            xp = xp_granted,
            "awarded tiers"
        );
    }

    AwardOutcome {
        submission_id: submission.id,
        athlete_id: athlete.id,
        division,
        achieved_rank: achieved,
        xp_awarded_total: submission.xp_awarded.saturating_add(xp_granted),
        claim,
        bonus_xp,
        xp_granted,
        domains,
        transactions,
    }
}

fn tier_list(tiers: &[Rank]) -> String {
    tiers.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
}
