//! Error types for the progression engine.
//!
//! Business outcomes (no tier met, review rejected, breakthrough not ready)
//! are plain values. Only data-integrity and boundary failures land here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AscentError {
    #[error("Invalid rank symbol: {0:?}")]
    InvalidRank(String),

    #[error("Invalid sublevel {0} (must be 0-9)")]
    InvalidSublevel(u8),

    #[error("Invalid XP split: {0}")]
    InvalidSplit(String),

    #[error("Invalid rank scale: {0}")]
    InvalidScale(String),

    #[error("Unknown challenge: {0}")]
    UnknownChallenge(String),

    #[error("Unknown submission: {0}")]
    UnknownSubmission(String),

    #[error("Unknown athlete: {0}")]
    UnknownAthlete(String),

    #[error("Submission {id} is {status}, cannot approve")]
    InvalidTransition { id: String, status: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AscentError {
    pub fn code(&self) -> i32 {
        match self {
            AscentError::InvalidRank(_) => -32010,
            AscentError::InvalidSublevel(_) => -32011,
            AscentError::InvalidSplit(_) => -32012,
            AscentError::InvalidScale(_) => -32013,
            AscentError::UnknownChallenge(_) => -32020,
            AscentError::UnknownSubmission(_) => -32021,
            AscentError::UnknownAthlete(_) => -32022,
            AscentError::InvalidTransition { .. } => -32023,
            AscentError::Config(_) => -32030,
            AscentError::Io(_) => -32006,
            AscentError::Json(_) => -32700,
            AscentError::Toml(_) => -32701,
        }
    }
}

pub type Result<T> = std::result::Result<T, AscentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            AscentError::InvalidRank("Z".into()),
            AscentError::InvalidSublevel(12),
            AscentError::InvalidSplit("x".into()),
            AscentError::InvalidScale("x".into()),
            AscentError::UnknownChallenge("x".into()),
            AscentError::UnknownSubmission("x".into()),
            AscentError::UnknownAthlete("x".into()),
            AscentError::InvalidTransition {
                id: "x".into(),
                status: "rejected".into(),
            },
            AscentError::Config("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AscentError::InvalidRank("Q".into()).to_string(),
            "Invalid rank symbol: \"Q\""
        );
        assert_eq!(
            AscentError::InvalidSublevel(10).to_string(),
            "Invalid sublevel 10 (must be 0-9)"
        );
    }
}
