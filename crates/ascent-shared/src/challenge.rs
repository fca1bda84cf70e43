//! Challenge configuration and submission records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::athlete::AthleteId;
use crate::domain::{Domain, XpSplit};
use crate::error::{AscentError, Result};
use crate::grading::{ChallengeGrade, Division, Gender};
use crate::rank::Rank;
use crate::tiers::ClaimedTiers;

pub type ChallengeId = Uuid;
pub type SubmissionId = Uuid;

/// Challenge configuration from the content admin subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub name: String,
    /// True for timed measurements
    #[serde(default)]
    pub lower_is_better: bool,
    pub min_rank: Rank,
    pub max_rank: Rank,
    pub split: XpSplit,
    /// Divisions in priority order; the first one matching an athlete wins
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub grades: Vec<ChallengeGrade>,
}

impl Challenge {
    pub fn new(id: ChallengeId, name: &str, min_rank: Rank, max_rank: Rank, split: XpSplit) -> Self {
        Self {
            id,
            name: name.to_string(),
            lower_is_better: false,
            min_rank,
            max_rank,
            split,
            divisions: Vec::new(),
            grades: Vec::new(),
        }
    }

    pub fn timed(mut self) -> Self {
        self.lower_is_better = true;
        self
    }

    pub fn with_division(mut self, division: Division) -> Self {
        self.divisions.push(division);
        self
    }

    pub fn with_grade(mut self, grade: ChallengeGrade) -> Self {
        self.grades.push(grade);
        self
    }

    pub fn primary_domain(&self) -> &Domain {
        self.split.primary_domain()
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_rank > self.max_rank {
            return Err(AscentError::Config(format!(
                "challenge {}: min_rank {} above max_rank {}",
                self.name, self.min_rank, self.max_rank
            )));
        }
        self.split.validate()
    }

    /// First configured division the athlete falls in
    pub fn division_for(&self, gender: Option<Gender>, age: Option<u32>) -> Option<&Division> {
        self.divisions.iter().find(|d| d.matches(gender, age))
    }

    /// Grade bars of one division
    pub fn grades_in<'a>(&'a self, division: &'a str) -> impl Iterator<Item = &'a ChallengeGrade> + 'a {
        self.grades.iter().filter(move |g| g.division == division)
    }

    /// (rank, target) bars that apply to an athlete; empty if no division matches
    pub fn bars_for(&self, gender: Option<Gender>, age: Option<u32>) -> Vec<(Rank, f64)> {
        match self.division_for(gender, age) {
            Some(division) => self
                .grades_in(&division.name)
                .map(|g| (g.rank, g.target_value))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Extra XP configured on a division's bar for `rank`
    pub fn bonus_for(&self, division: &str, rank: Rank) -> u64 {
        self.grades_in(division)
            .filter(|g| g.rank == rank)
            .map(|g| g.bonus_xp)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// An athlete's attempt at a challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSubmission {
    pub id: SubmissionId,
    pub athlete_id: AthleteId,
    pub challenge_id: ChallengeId,
    pub achieved_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achieved_rank: Option<Rank>,
    #[serde(default)]
    pub claimed_tiers: ClaimedTiers,
    #[serde(default)]
    pub xp_awarded: u64,
    #[serde(default)]
    pub status: SubmissionStatus,
}

impl ChallengeSubmission {
    pub fn new(id: SubmissionId, athlete_id: AthleteId, challenge_id: ChallengeId, achieved_value: f64) -> Self {
        Self {
            id,
            athlete_id,
            challenge_id,
            achieved_value,
            achieved_rank: None,
            claimed_tiers: ClaimedTiers::new(),
            xp_awarded: 0,
            status: SubmissionStatus::Pending,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == SubmissionStatus::Approved
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }

    /// Achieved rank, with ungraded submissions treated as the lowest tier
    pub fn tier_or_lowest(&self) -> Rank {
        self.achieved_rank.unwrap_or(Rank::LOWEST)
    }
}
