//! Tier Achievement Resolver.
//!
//! Maps a raw measurement onto the highest rank bar it meets for the
//! athlete's division. Pure: no I/O, no state.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::rank::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Age/gender bracket that selects which grade targets apply.
/// Unset bounds match anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u8>,
}

impl Division {
    /// Division that matches every athlete
    pub fn open(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gender: None,
            min_age: None,
            max_age: None,
        }
    }

    pub fn for_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn aged(mut self, min_age: Option<u8>, max_age: Option<u8>) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    /// Whether an athlete falls in this bracket. An unknown gender or age
    /// only matches brackets that do not constrain it.
    pub fn matches(&self, gender: Option<Gender>, age: Option<u32>) -> bool {
        if let Some(required) = self.gender {
            if gender != Some(required) {
                return false;
            }
        }
        if self.min_age.is_some() || self.max_age.is_some() {
            let Some(age) = age else {
                return false;
            };
            if self.min_age.is_some_and(|min| age < min as u32) {
                return false;
            }
            if self.max_age.is_some_and(|max| age > max as u32) {
                return false;
            }
        }
        true
    }
}

/// The performance bar required to claim one rank tier on a challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeGrade {
    pub division: String,
    pub rank: Rank,
    pub target_value: f64,
    #[serde(default)]
    pub bonus_xp: u64,
}

impl ChallengeGrade {
    pub fn new(division: &str, rank: Rank, target_value: f64) -> Self {
        Self {
            division: division.to_string(),
            rank,
            target_value,
            bonus_xp: 0,
        }
    }

    pub fn with_bonus(mut self, bonus_xp: u64) -> Self {
        self.bonus_xp = bonus_xp;
        self
    }
}

/// Whether `value` meets `target` in the grading direction. Inclusive.
pub fn meets(value: f64, target: f64, lower_is_better: bool) -> bool {
    if lower_is_better {
        value <= target
    } else {
        value >= target
    }
}

/// Highest rank whose bar `achieved_value` meets, or `None`.
///
/// Bars are scanned from easiest to hardest; every bar that is met can only
/// raise the result, so duplicated or out-of-order targets still yield the
/// best rank actually met. NaN meets nothing.
pub fn resolve_tier(achieved_value: f64, bars: &[(Rank, f64)], lower_is_better: bool) -> Option<Rank> {
    let mut ordered: Vec<(Rank, f64)> = bars.to_vec();
    ordered.sort_by(|a, b| {
        let by_target = if lower_is_better {
            b.1.total_cmp(&a.1)
        } else {
            a.1.total_cmp(&b.1)
        };
        match by_target {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        }
    });

    let mut best: Option<Rank> = None;
    for (rank, target) in ordered {
        if meets(achieved_value, target, lower_is_better) {
            best = Some(best.map_or(rank, |b| b.max(rank)));
        }
    }

    tracing::debug!(
        value = achieved_value,
        bars = bars.len(),
        lower_is_better,
        achieved = ?best,
        "resolved tier"
    );
    best
}
