//! Snapshot store: the whole engine state as one JSON document.
//!
//! Every mutating operation computes its outcome against the current
//! value first and only then commits, so a failed lookup leaves the
//! snapshot untouched. The file is always rewritten whole.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::athlete::{Athlete, AthleteId};
use crate::award::{award_submission, AwardOutcome};
use crate::breakthrough::{qualify, BreakthroughRule, Qualification};
use crate::challenge::{Challenge, ChallengeId, ChallengeSubmission, SubmissionId, SubmissionStatus};
use crate::domain::Domain;
use crate::error::{AscentError, Result};
use crate::ledger::XpLedger;
use crate::level::{BreakthroughOutcome, DomainLevel};
use crate::reconcile::{self, ReconcilePlan};
use crate::review_gate::{evaluate_review, reviewable_submissions, reviewer_level_for, ReviewDecision, ReviewPolicy};
use crate::reversal::{reverse_submission, ReversalOutcome};
use crate::scale::RankScale;
use crate::tiers::ClaimedTiers;

/// Default snapshot location
pub const SNAPSHOT_PATH: &str = "/var/lib/ascent/snapshot.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub athletes: Vec<Athlete>,
    pub challenges: Vec<Challenge>,
    pub submissions: Vec<ChallengeSubmission>,
    pub levels: Vec<DomainLevel>,
    pub ledger: XpLedger,
    pub breakthrough_rules: Vec<BreakthroughRule>,
}

/// Result of a breakthrough attempt, with the gate that was evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakthroughAttempt {
    pub domain: Domain,
    pub division: Option<String>,
    pub qualification: Qualification,
    pub outcome: BreakthroughOutcome,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file is an empty snapshot
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot on disk, starting empty");
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject records that break the engine's invariants
    pub fn validate(&self) -> Result<()> {
        for challenge in &self.challenges {
            challenge.validate()?;
        }
        for level in &self.levels {
            level.state.validate()?;
        }
        for rule in &self.breakthrough_rules {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn athlete(&self, id: AthleteId) -> Result<&Athlete> {
        self.athletes
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| AscentError::UnknownAthlete(id.to_string()))
    }

    pub fn challenge(&self, id: ChallengeId) -> Result<&Challenge> {
        self.challenges
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AscentError::UnknownChallenge(id.to_string()))
    }

    pub fn submission(&self, id: SubmissionId) -> Result<&ChallengeSubmission> {
        self.submissions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AscentError::UnknownSubmission(id.to_string()))
    }

    pub fn challenge_map(&self) -> HashMap<ChallengeId, Challenge> {
        self.challenges.iter().map(|c| (c.id, c.clone())).collect()
    }

    pub fn athlete_map(&self) -> HashMap<AthleteId, Athlete> {
        self.athletes.iter().map(|a| (a.id, a.clone())).collect()
    }

    pub fn levels_for(&self, athlete_id: AthleteId) -> impl Iterator<Item = &DomainLevel> {
        self.levels.iter().filter(move |l| l.athlete_id == athlete_id)
    }

    fn upsert_levels(&mut self, records: Vec<DomainLevel>) {
        for record in records {
            match self
                .levels
                .iter()
                .position(|l| l.athlete_id == record.athlete_id && l.domain == record.domain)
            {
                Some(i) => self.levels[i] = record,
                None => self.levels.push(record),
            }
        }
    }

    fn replace_submission(&mut self, updated: ChallengeSubmission) {
        if let Some(slot) = self.submissions.iter_mut().find(|s| s.id == updated.id) {
            *slot = updated;
        }
    }

    /// Approve a submission and pay out any newly claimed tiers.
    ///
    /// Only pending submissions move to approved. Re-awarding an approved
    /// one pays nothing new; a rejected one is final.
    pub fn approve_and_award(&mut self, scale: &RankScale, submission_id: SubmissionId, today: NaiveDate) -> Result<AwardOutcome> {
        let submission = self.submission(submission_id)?;
        if submission.status == SubmissionStatus::Rejected {
            return Err(AscentError::InvalidTransition {
                id: submission_id.to_string(),
                status: "rejected".to_string(),
            });
        }
        let challenge = self.challenge(submission.challenge_id)?;
        let athlete = self.athlete(submission.athlete_id)?;

        let outcome = award_submission(scale, challenge, athlete, submission, &self.levels, today);
        let mut updated = outcome.apply_to(submission);
        updated.status = SubmissionStatus::Approved;

        self.replace_submission(updated);
        self.upsert_levels(outcome.level_records());
        self.ledger.extend(outcome.transactions.iter().cloned());
        Ok(outcome)
    }

    /// Take back a paid-out submission and mark it rejected
    pub fn reverse(&mut self, scale: &RankScale, submission_id: SubmissionId) -> Result<ReversalOutcome> {
        let submission = self.submission(submission_id)?;
        let challenge = self.challenge(submission.challenge_id)?;

        let outcome = reverse_submission(scale, challenge, submission, &self.levels, &self.ledger);
        let mut updated = submission.clone();
        updated.status = SubmissionStatus::Rejected;
        updated.xp_awarded = 0;
        updated.claimed_tiers = ClaimedTiers::new();
        let athlete_id = updated.athlete_id;

        self.replace_submission(updated);
        self.upsert_levels(outcome.level_records(athlete_id));
        self.ledger.remove_ids(&outcome.ledger_removals);
        Ok(outcome)
    }

    /// Rebuild one athlete's levels from their approved submissions
    pub fn reconcile(&mut self, scale: &RankScale, athlete_id: AthleteId) -> Result<ReconcilePlan> {
        self.athlete(athlete_id)?;
        let plan = reconcile::plan(
            scale,
            athlete_id,
            &self.submissions,
            &self.challenge_map(),
            &self.levels,
            &self.ledger,
        );
        reconcile::apply(&plan, &mut self.levels, &mut self.ledger);
        Ok(plan)
    }

    /// Reconcile every athlete in the snapshot
    pub fn reconcile_all(&mut self, scale: &RankScale) -> Vec<ReconcilePlan> {
        let ids: Vec<AthleteId> = self.athletes.iter().map(|a| a.id).collect();
        let challenges = self.challenge_map();
        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            let plan = reconcile::plan(scale, id, &self.submissions, &challenges, &self.levels, &self.ledger);
            reconcile::apply(&plan, &mut self.levels, &mut self.ledger);
            plans.push(plan);
        }
        plans
    }

    /// Division the athlete competes in for `domain`: the first matching
    /// division of any challenge whose primary domain it is.
    pub fn division_in(&self, athlete: &Athlete, domain: &Domain, today: NaiveDate) -> Option<String> {
        let age = athlete.age_on(today);
        self.challenges
            .iter()
            .filter(|c| c.primary_domain() == domain)
            .find_map(|c| c.division_for(athlete.gender, age))
            .map(|d| d.name.clone())
    }

    /// Attempt a breakthrough in one domain, committing a promotion
    pub fn breakthrough(&mut self, athlete_id: AthleteId, domain: &Domain, today: NaiveDate) -> Result<BreakthroughAttempt> {
        let athlete = self.athlete(athlete_id)?;
        let division = self.division_in(athlete, domain, today);
        let level = self
            .levels
            .iter()
            .find(|l| l.athlete_id == athlete_id && &l.domain == domain)
            .map(|l| l.state)
            .unwrap_or_default();

        let history: Vec<ChallengeSubmission> = self
            .submissions
            .iter()
            .filter(|s| s.athlete_id == athlete_id)
            .cloned()
            .collect();
        let qualification = qualify(
            &self.breakthrough_rules,
            domain,
            level.rank,
            division.as_deref(),
            &self.challenge_map(),
            &history,
        );
        let outcome = level.breakthrough(&qualification);

        if let BreakthroughOutcome::Promoted { state, .. } = &outcome {
            self.upsert_levels(vec![DomainLevel::new(athlete_id, domain.clone(), *state)]);
        }
        Ok(BreakthroughAttempt {
            domain: domain.clone(),
            division,
            qualification,
            outcome,
        })
    }

    /// Single-submission review authorization
    pub fn can_review(
        &self,
        policy: &ReviewPolicy,
        reviewer_id: AthleteId,
        submission_id: SubmissionId,
        today: NaiveDate,
    ) -> Result<ReviewDecision> {
        let reviewer = self.athlete(reviewer_id)?;
        let submission = self.submission(submission_id)?;
        let challenge = self.challenge(submission.challenge_id)?;
        let level = reviewer_level_for(&self.levels, reviewer_id, challenge);
        let guardian = self
            .athletes
            .iter()
            .find(|a| a.id == submission.athlete_id)
            .and_then(|a| a.guardian_id);
        Ok(evaluate_review(policy, reviewer, level, submission, guardian, today))
    }

    /// Pending submissions the reviewer may act on
    pub fn review_queue(
        &self,
        policy: &ReviewPolicy,
        reviewer_id: AthleteId,
        today: NaiveDate,
    ) -> Result<Vec<&ChallengeSubmission>> {
        let reviewer = self.athlete(reviewer_id)?;
        Ok(reviewable_submissions(
            policy,
            reviewer,
            &self.levels,
            &self.submissions,
            &self.challenge_map(),
            &self.athlete_map(),
            today,
        ))
    }
}
