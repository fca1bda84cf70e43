//! Breakthrough qualification.
//!
//! XP alone never buys a rank letter. A breakthrough also requires proven
//! performance: `tier_required` (or better) on `challenge_count` distinct
//! challenges in the domain. Rules come from content admin; this module
//! only evaluates them against submission history.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::challenge::{Challenge, ChallengeId, ChallengeSubmission};
use crate::domain::Domain;
use crate::error::{AscentError, Result};
use crate::rank::Rank;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakthroughRule {
    pub domain: Domain,
    /// Division name this rule is scoped to; `None` applies to everyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    pub from_rank: Rank,
    pub to_rank: Rank,
    pub tier_required: Rank,
    pub challenge_count: u32,
}

impl BreakthroughRule {
    /// A rule promotes exactly one rank letter
    pub fn validate(&self) -> Result<()> {
        if self.from_rank.next() != Some(self.to_rank) {
            return Err(AscentError::Config(format!(
                "breakthrough rule for {}: {} does not lead to {}",
                self.domain, self.from_rank, self.to_rank
            )));
        }
        Ok(())
    }
}

/// Outcome of checking an athlete against the applicable rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Qualification {
    Qualified {
        rule: BreakthroughRule,
        challenges_met: u32,
    },
    Insufficient {
        rule: BreakthroughRule,
        challenges_met: u32,
    },
    /// No rule is configured for this domain and rank
    NoRule,
}

impl Qualification {
    pub fn is_qualified(&self) -> bool {
        matches!(self, Qualification::Qualified { .. })
    }

    /// Human-readable summary for status output
    pub fn describe(&self) -> String {
        match self {
            Qualification::Qualified { rule, challenges_met } => format!(
                "qualified: {} of {} challenges at rank {} or better",
                challenges_met, rule.challenge_count, rule.tier_required
            ),
            Qualification::Insufficient { rule, challenges_met } => format!(
                "needs rank {} or better on {} challenges ({} so far)",
                rule.tier_required, rule.challenge_count, challenges_met
            ),
            Qualification::NoRule => "no breakthrough rule configured".to_string(),
        }
    }
}

/// Pick the rule for (domain, from_rank), preferring one scoped to the
/// athlete's division over a division-less one.
pub fn applicable_rule<'a>(
    rules: &'a [BreakthroughRule],
    domain: &Domain,
    from_rank: Rank,
    division: Option<&str>,
) -> Option<&'a BreakthroughRule> {
    let candidates = rules
        .iter()
        .filter(|r| &r.domain == domain && r.from_rank == from_rank)
        .filter(|r| from_rank.next() == Some(r.to_rank));

    let mut generic = None;
    for rule in candidates {
        match (&rule.division, division) {
            (Some(scoped), Some(athlete)) if scoped == athlete => return Some(rule),
            (None, _) if generic.is_none() => generic = Some(rule),
            _ => {}
        }
    }
    generic
}

/// Count distinct challenges whose primary domain is `domain` and on which
/// an approved submission reached at least `tier_required`.
pub fn challenges_meeting(
    domain: &Domain,
    tier_required: Rank,
    challenges: &HashMap<ChallengeId, Challenge>,
    history: &[ChallengeSubmission],
) -> u32 {
    let met: HashSet<ChallengeId> = history
        .iter()
        .filter(|s| s.is_approved())
        .filter(|s| s.achieved_rank.is_some_and(|r| r >= tier_required))
        .filter(|s| {
            challenges
                .get(&s.challenge_id)
                .is_some_and(|c| c.primary_domain() == domain)
        })
        .map(|s| s.challenge_id)
        .collect();
    met.len() as u32
}

/// Evaluate the breakthrough gate for one athlete in one domain
pub fn qualify(
    rules: &[BreakthroughRule],
    domain: &Domain,
    from_rank: Rank,
    division: Option<&str>,
    challenges: &HashMap<ChallengeId, Challenge>,
    history: &[ChallengeSubmission],
) -> Qualification {
    let Some(rule) = applicable_rule(rules, domain, from_rank, division) else {
        return Qualification::NoRule;
    };

    let challenges_met = challenges_meeting(domain, rule.tier_required, challenges, history);
    if challenges_met >= rule.challenge_count {
        Qualification::Qualified {
            rule: rule.clone(),
            challenges_met,
        }
    } else {
        Qualification::Insufficient {
            rule: rule.clone(),
            challenges_met,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::SubmissionStatus;
    use crate::domain::XpSplit;
    use uuid::Uuid;

    fn rule(division: Option<&str>, count: u32) -> BreakthroughRule {
        BreakthroughRule {
            domain: Domain::new("strength"),
            division: division.map(str::to_string),
            from_rank: Rank::E,
            to_rank: Rank::D,
            tier_required: Rank::D,
            challenge_count: count,
        }
    }

    fn catalog() -> HashMap<ChallengeId, Challenge> {
        let mut map = HashMap::new();
        for (n, domain) in [(1u128, "strength"), (2, "strength"), (3, "endurance")] {
            let id = Uuid::from_u128(n);
            map.insert(
                id,
                Challenge::new(id, "c", Rank::F, Rank::S, XpSplit::single(domain)),
            );
        }
        map
    }

    fn approved(challenge: u128, rank: Rank) -> ChallengeSubmission {
        let mut sub = ChallengeSubmission::new(Uuid::new_v4(), Uuid::nil(), Uuid::from_u128(challenge), 0.0);
        sub.achieved_rank = Some(rank);
        sub.status = SubmissionStatus::Approved;
        sub
    }

    #[test]
    fn test_division_rule_preferred() {
        let rules = vec![rule(None, 3), rule(Some("women"), 2)];
        let domain = Domain::new("strength");
        let picked = applicable_rule(&rules, &domain, Rank::E, Some("women")).unwrap();
        assert_eq!(picked.challenge_count, 2);
        let fallback = applicable_rule(&rules, &domain, Rank::E, Some("men")).unwrap();
        assert_eq!(fallback.challenge_count, 3);
        assert!(applicable_rule(&rules, &domain, Rank::D, None).is_none());
    }

    #[test]
    fn test_rule_must_target_next_rank() {
        let mut skip = rule(Some("women"), 1);
        skip.to_rank = Rank::C;
        assert!(matches!(skip.validate(), Err(AscentError::Config(_))));
        assert!(rule(None, 3).validate().is_ok());

        let rules = vec![skip, rule(None, 3)];
        let picked = applicable_rule(&rules, &Domain::new("strength"), Rank::E, Some("women")).unwrap();
        assert_eq!(picked.to_rank, Rank::D);
        assert_eq!(picked.challenge_count, 3);
    }

    #[test]
    fn test_distinct_challenges_counted_once() {
        let history = vec![
            approved(1, Rank::D),
            approved(1, Rank::C),
            approved(2, Rank::E), // below requirement
            approved(3, Rank::A), // other domain
        ];
        let n = challenges_meeting(&Domain::new("strength"), Rank::D, &catalog(), &history);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_pending_submissions_ignored() {
        let mut pending = approved(2, Rank::B);
        pending.status = SubmissionStatus::Pending;
        let history = vec![approved(1, Rank::D), pending];
        let q = qualify(&[rule(None, 2)], &Domain::new("strength"), Rank::E, None, &catalog(), &history);
        assert!(!q.is_qualified());
        assert!(matches!(q, Qualification::Insufficient { challenges_met: 1, .. }));
    }

    #[test]
    fn test_qualified() {
        let history = vec![approved(1, Rank::D), approved(2, Rank::C)];
        let q = qualify(&[rule(None, 2)], &Domain::new("strength"), Rank::E, None, &catalog(), &history);
        assert!(q.is_qualified());
        assert!(q.describe().starts_with("qualified"));
    }

    #[test]
    fn test_no_rule() {
        let q = qualify(&[], &Domain::new("strength"), Rank::E, None, &catalog(), &[]);
        assert_eq!(q, Qualification::NoRule);
        assert!(!q.is_qualified());
    }
}
