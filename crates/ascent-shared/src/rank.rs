//! Rank letters and the numeric level encoding.
//!
//! Seven ordered ranks, lowest first: F, E, D, C, B, A, S.
//! A (rank, sublevel) pair encodes to `index * 10 + sublevel`, giving a
//! single comparable integer in 0..=69.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AscentError;

/// Highest sublevel within a rank
pub const MAX_SUBLEVEL: u8 = 9;

/// Number of rank letters
pub const RANK_COUNT: usize = 7;

/// Coarse progression tier within a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    F,
    E,
    D,
    C,
    B,
    A,
    S,
}

impl Rank {
    /// All ranks, lowest to highest
    pub const ALL: [Rank; RANK_COUNT] = [
        Rank::F,
        Rank::E,
        Rank::D,
        Rank::C,
        Rank::B,
        Rank::A,
        Rank::S,
    ];

    pub const LOWEST: Rank = Rank::F;
    pub const TOP: Rank = Rank::S;

    /// Position in the ordered sequence (F = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Rank at a position, clamped to the top rank
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(RANK_COUNT - 1)]
    }

    /// The rank directly above, if any
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The rank directly below, if any
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(Self::from_index)
    }

    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    pub fn letter(self) -> char {
        match self {
            Rank::F => 'F',
            Rank::E => 'E',
            Rank::D => 'D',
            Rank::C => 'C',
            Rank::B => 'B',
            Rank::A => 'A',
            Rank::S => 'S',
        }
    }

    /// Ranks from `low` to `high` inclusive, ascending. Empty when `low > high`.
    pub fn span(low: Rank, high: Rank) -> impl Iterator<Item = Rank> {
        Self::ALL
            .into_iter()
            .filter(move |r| *r >= low && *r <= high)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Rank {
    type Err = AscentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "F" => Ok(Rank::F),
            "E" => Ok(Rank::E),
            "D" => Ok(Rank::D),
            "C" => Ok(Rank::C),
            "B" => Ok(Rank::B),
            "A" => Ok(Rank::A),
            "S" => Ok(Rank::S),
            _ => Err(AscentError::InvalidRank(s.to_string())),
        }
    }
}

/// Encode a rank and sublevel as a single comparable integer.
/// Sublevels above 9 are clamped.
pub fn to_numeric(rank: Rank, sublevel: u8) -> u8 {
    rank.index() as u8 * 10 + sublevel.min(MAX_SUBLEVEL)
}

/// Decode a numeric level. Values past the top (69) clamp to (S, 9).
pub fn from_numeric(level: u8) -> (Rank, u8) {
    let level = level.min(to_numeric(Rank::TOP, MAX_SUBLEVEL));
    (Rank::from_index((level / 10) as usize), level % 10)
}
