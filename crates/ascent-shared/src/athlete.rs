//! Identity records consumed from the identity subsystem.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::Gender;

pub type AthleteId = Uuid;

/// Account role. Coach and Admin are the elevated roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Athlete,
    Guardian,
    Coach,
    Admin,
}

impl Role {
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Coach | Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub suspended: bool,
    /// Banned from reviewing other athletes' submissions
    #[serde(default)]
    pub review_banned: bool,
    #[serde(default = "default_true")]
    pub has_athlete_profile: bool,
    /// Guardian account managing this athlete, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_id: Option<AthleteId>,
}

fn default_true() -> bool {
    true
}

impl Athlete {
    pub fn new(id: AthleteId, display_name: &str) -> Self {
        Self {
            id,
            display_name: display_name.to_string(),
            role: Role::Athlete,
            date_of_birth: None,
            gender: None,
            suspended: false,
            review_banned: false,
            has_athlete_profile: true,
            guardian_id: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn born(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn managed_by(mut self, guardian_id: AthleteId) -> Self {
        self.guardian_id = Some(guardian_id);
        self
    }

    /// Age in whole years on `today`, if the date of birth is known
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth.map(|dob| age_on(dob, today))
    }
}

/// Whole years between `dob` and `today`; 0 if `today` precedes `dob`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}
