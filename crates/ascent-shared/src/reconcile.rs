//! Reconciliation Engine.
//!
//! Rebuilds an athlete's domain levels from scratch out of their approved
//! submissions. Each domain's total is re-derived through the challenge
//! splits and flattened onto the cumulative table (no banked XP, no
//! breakthrough history). Only differences from the stored state are
//! planned, so applying a plan and planning again yields an empty plan.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use crate::athlete::AthleteId;
use crate::challenge::{Challenge, ChallengeId, ChallengeSubmission};
use crate::domain::Domain;
use crate::ledger::{XpLedger, XpSource};
use crate::level::{DomainLevel, LevelState};
use crate::scale::RankScale;

/// Writes needed to bring stored state in line with submission history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    pub athlete_id: AthleteId,
    /// Recomputed XP per domain
    pub totals: BTreeMap<Domain, u64>,
    /// Levels to insert or overwrite
    pub upserts: Vec<DomainLevel>,
    /// Domains whose level should be deleted (recomputed XP is zero)
    pub deletions: Vec<Domain>,
    /// Challenge ledger rows with no approved submission behind them
    pub ledger_removals: Vec<Uuid>,
}

impl ReconcilePlan {
    /// No writes required
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty() && self.ledger_removals.is_empty()
    }

    pub fn write_count(&self) -> usize {
        self.upserts.len() + self.deletions.len() + self.ledger_removals.len()
    }
}

/// Sum each domain's share of every approved submission's award
pub fn domain_totals(
    athlete_id: AthleteId,
    submissions: &[ChallengeSubmission],
    challenges: &HashMap<ChallengeId, Challenge>,
) -> BTreeMap<Domain, u64> {
    let mut totals: BTreeMap<Domain, u64> = BTreeMap::new();
    for sub in submissions
        .iter()
        .filter(|s| s.athlete_id == athlete_id && s.is_approved())
    {
        let Some(challenge) = challenges.get(&sub.challenge_id) else {
            tracing::warn!(
                submission = %sub.id,
                challenge = %sub.challenge_id,
                "approved submission references unknown challenge; skipped"
            );
            continue;
        };
        for (domain, xp) in challenge.split.distribute(sub.xp_awarded) {
            let entry = totals.entry(domain).or_insert(0);
            *entry = entry.saturating_add(xp);
        }
    }
    totals
}

/// Plan a from-scratch rebuild for one athlete
pub fn plan(
    scale: &RankScale,
    athlete_id: AthleteId,
    submissions: &[ChallengeSubmission],
    challenges: &HashMap<ChallengeId, Challenge>,
    levels: &[DomainLevel],
    ledger: &XpLedger,
) -> ReconcilePlan {
    let totals = domain_totals(athlete_id, submissions, challenges);
    let existing: HashMap<&Domain, &LevelState> = levels
        .iter()
        .filter(|l| l.athlete_id == athlete_id)
        .map(|l| (&l.domain, &l.state))
        .collect();

    let mut upserts = Vec::new();
    for (domain, &xp) in totals.iter().filter(|(_, xp)| **xp > 0) {
        let desired = LevelState::from_total(scale, xp);
        if existing.get(domain).copied() != Some(&desired) {
            upserts.push(DomainLevel::new(athlete_id, domain.clone(), desired));
        }
    }

    let mut deletions: Vec<Domain> = existing
        .keys()
        .filter(|d| totals.get(**d).copied().unwrap_or(0) == 0)
        .map(|d| (*d).clone())
        .collect();
    deletions.sort();

    let approved: HashSet<Uuid> = submissions
        .iter()
        .filter(|s| s.athlete_id == athlete_id && s.is_approved())
        .map(|s| s.id)
        .collect();
    let ledger_removals: Vec<Uuid> = ledger
        .for_athlete(athlete_id)
        .filter(|e| e.source == XpSource::Challenge && !approved.contains(&e.source_id))
        .map(|e| e.id)
        .collect();

    let plan = ReconcilePlan {
        athlete_id,
        totals,
        upserts,
        deletions,
        ledger_removals,
    };
    tracing::info!(
        athlete = %athlete_id,
        upserts = plan.upserts.len(),
        deletions = plan.deletions.len(),
        ledger_removals = plan.ledger_removals.len(),
        "reconciliation planned"
    );
    plan
}

/// Apply a plan to in-memory level and ledger collections
pub fn apply(plan: &ReconcilePlan, levels: &mut Vec<DomainLevel>, ledger: &mut XpLedger) {
    for upsert in &plan.upserts {
        match levels
            .iter()
            .position(|l| l.athlete_id == upsert.athlete_id && l.domain == upsert.domain)
        {
            Some(i) => levels[i].state = upsert.state,
            None => levels.push(upsert.clone()),
        }
    }
    levels.retain(|l| !(l.athlete_id == plan.athlete_id && plan.deletions.contains(&l.domain)));
    ledger.remove_ids(&plan.ledger_removals);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::SubmissionStatus;
    use crate::domain::XpSplit;
    use crate::ledger::XpTransaction;
    use crate::rank::Rank;

    const ATHLETE: u128 = 1;

    fn challenges() -> HashMap<ChallengeId, Challenge> {
        let mut map = HashMap::new();
        let a = Uuid::from_u128(10);
        let b = Uuid::from_u128(11);
        map.insert(a, Challenge::new(a, "Squat", Rank::F, Rank::S, XpSplit::single("strength")));
        map.insert(
            b,
            Challenge::new(
                b,
                "Burpees",
                Rank::F,
                Rank::S,
                XpSplit {
                    primary: crate::domain::DomainShare::new("endurance", 50),
                    secondary: None,
                    tertiary: None,
                }
                .with_secondary("strength", 50),
            ),
        );
        map
    }

    fn sub(n: u128, challenge: u128, xp: u64, status: SubmissionStatus) -> ChallengeSubmission {
        let mut s = ChallengeSubmission::new(Uuid::from_u128(n), Uuid::from_u128(ATHLETE), Uuid::from_u128(challenge), 0.0);
        s.xp_awarded = xp;
        s.status = status;
        s
    }

    #[test]
    fn test_totals_follow_splits() {
        let subs = vec![
            sub(100, 10, 1_000, SubmissionStatus::Approved),
            sub(101, 11, 400, SubmissionStatus::Approved),
            sub(102, 10, 9_999, SubmissionStatus::Rejected),
            sub(103, 99, 500, SubmissionStatus::Approved), // unknown challenge
        ];
        let totals = domain_totals(Uuid::from_u128(ATHLETE), &subs, &challenges());
        assert_eq!(totals.get(&Domain::new("strength")), Some(&1_200));
        assert_eq!(totals.get(&Domain::new("endurance")), Some(&200));
    }

    #[test]
    fn test_plan_flattens_and_deletes() {
        let scale = RankScale::default();
        let athlete = Uuid::from_u128(ATHLETE);
        let subs = vec![sub(100, 10, 3_500, SubmissionStatus::Approved)];
        let levels = vec![
            // Banked state from incremental awards
            DomainLevel::new(athlete, Domain::new("strength"), LevelState::new().apply_xp(&scale, 3_500).after),
            DomainLevel::new(athlete, Domain::new("mobility"), LevelState::new().apply_xp(&scale, 10).after),
        ];
        let mut ledger = XpLedger::new();
        ledger.append(XpTransaction::new(athlete, Domain::new("strength"), 3_500, XpSource::Challenge, Uuid::from_u128(100)));
        ledger.append(XpTransaction::new(athlete, Domain::new("mobility"), 10, XpSource::Challenge, Uuid::from_u128(555)));
        ledger.append(XpTransaction::new(athlete, Domain::new("mobility"), 5, XpSource::Adjustment, Uuid::nil()));

        let plan = plan(&scale, athlete, &subs, &challenges(), &levels, &ledger);
        assert_eq!(plan.upserts.len(), 1);
        let rebuilt = plan.upserts[0].state;
        assert_eq!(rebuilt.rank, Rank::D);
        assert_eq!(rebuilt.sublevel, 1);
        assert_eq!(rebuilt.banked_xp, 0);
        assert!(!rebuilt.breakthrough_ready);
        assert_eq!(plan.deletions, vec![Domain::new("mobility")]);
        assert_eq!(plan.ledger_removals.len(), 1);
    }

    #[test]
    fn test_reconciliation_is_fixed_point() {
        let scale = RankScale::default();
        let athlete = Uuid::from_u128(ATHLETE);
        let subs = vec![
            sub(100, 10, 1_000, SubmissionStatus::Approved),
            sub(101, 11, 400, SubmissionStatus::Approved),
        ];
        let mut levels = vec![DomainLevel::new(athlete, Domain::new("strength"), LevelState::new())];
        let mut ledger = XpLedger::new();
        ledger.append(XpTransaction::new(athlete, Domain::new("strength"), 1, XpSource::Challenge, Uuid::from_u128(404)));

        let first = plan(&scale, athlete, &subs, &challenges(), &levels, &ledger);
        assert!(!first.is_empty());
        apply(&first, &mut levels, &mut ledger);

        let second = plan(&scale, athlete, &subs, &challenges(), &levels, &ledger);
        assert!(second.is_empty(), "second run still wants {} writes", second.write_count());
        assert_eq!(second.totals, first.totals);
    }

    #[test]
    fn test_other_athletes_untouched() {
        let scale = RankScale::default();
        let athlete = Uuid::from_u128(ATHLETE);
        let other = Uuid::from_u128(2);
        let mut levels = vec![DomainLevel::new(other, Domain::new("strength"), LevelState::new().apply_xp(&scale, 50).after)];
        let mut ledger = XpLedger::new();
        ledger.append(XpTransaction::new(other, Domain::new("strength"), 50, XpSource::Challenge, Uuid::from_u128(7)));

        let plan = plan(&scale, athlete, &[], &challenges(), &levels, &ledger);
        assert!(plan.is_empty());
        apply(&plan, &mut levels, &mut ledger);
        assert_eq!(levels.len(), 1);
        assert_eq!(ledger.entries.len(), 1);
    }
}
