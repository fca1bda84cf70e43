//! XP Reversal for submissions invalidated after they paid out.
//!
//! Subtracts the submission's award from each split domain (floored at
//! zero) and re-derives standing from the cumulative table. This is an
//! incremental correction; history replay is the reconciliation engine's
//! job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::challenge::{Challenge, ChallengeSubmission, SubmissionId};
use crate::domain::Domain;
use crate::ledger::{XpLedger, XpSource};
use crate::level::{DomainLevel, LevelTransition};
use crate::scale::RankScale;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReversal {
    pub domain: Domain,
    pub share: u64,
    pub transition: LevelTransition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalOutcome {
    pub submission_id: SubmissionId,
    pub amount: u64,
    pub domains: Vec<DomainReversal>,
    /// Split domains the athlete has no level in; nothing to subtract
    pub skipped: Vec<Domain>,
    /// Ledger rows written for the submission
    pub ledger_removals: Vec<Uuid>,
}

impl ReversalOutcome {
    pub fn level_records(&self, athlete_id: Uuid) -> Vec<DomainLevel> {
        self.domains
            .iter()
            .map(|d| DomainLevel::new(athlete_id, d.domain.clone(), d.transition.after))
            .collect()
    }
}

/// Work out how to take back everything `submission` was awarded
pub fn reverse_submission(
    scale: &RankScale,
    challenge: &Challenge,
    submission: &ChallengeSubmission,
    levels: &[DomainLevel],
    ledger: &XpLedger,
) -> ReversalOutcome {
    let amount = submission.xp_awarded;
    let mut domains = Vec::new();
    let mut skipped = Vec::new();

    for (domain, share) in challenge.split.distribute(amount) {
        let existing = levels
            .iter()
            .find(|l| l.athlete_id == submission.athlete_id && l.domain == domain);
        match existing {
            Some(level) => domains.push(DomainReversal {
                transition: level.state.reverse_xp(scale, share),
                domain,
                share,
            }),
            None => skipped.push(domain),
        }
    }

    let ledger_removals: Vec<Uuid> = ledger
        .for_source(XpSource::Challenge, submission.id)
        .map(|e| e.id)
        .collect();

    tracing::info!(
        submission = %submission.id,
        amount,
        domains = domains.len(),
        skipped = skipped.len(),
        ledger_rows = ledger_removals.len(),
        "reversed submission xp"
    );

    ReversalOutcome {
        submission_id: submission.id,
        amount,
        domains,
        skipped,
        ledger_removals,
    }
}
