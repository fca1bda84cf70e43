//! Claimed tiers: the ordered set of rank tiers already paid out for a
//! submission.
//!
//! Stored as a bitmask so it is always ascending and duplicate-free.
//! The comma-separated form ("F,E,D") exists only at the serde boundary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AscentError;
use crate::rank::Rank;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClaimedTiers(u8);

impl ClaimedTiers {
    pub fn new() -> Self {
        Self(0)
    }

    fn bit(rank: Rank) -> u8 {
        1 << rank.index()
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.0 & Self::bit(rank) != 0
    }

    /// Add a tier. Returns false if it was already claimed.
    pub fn insert(&mut self, rank: Rank) -> bool {
        let fresh = !self.contains(rank);
        self.0 |= Self::bit(rank);
        fresh
    }

    pub fn union(&self, other: &ClaimedTiers) -> ClaimedTiers {
        ClaimedTiers(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Tiers in ascending rank order
    pub fn iter(&self) -> impl Iterator<Item = Rank> + '_ {
        Rank::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    pub fn to_vec(&self) -> Vec<Rank> {
        self.iter().collect()
    }

    pub fn highest(&self) -> Option<Rank> {
        self.iter().last()
    }
}

impl FromIterator<Rank> for ClaimedTiers {
    fn from_iter<I: IntoIterator<Item = Rank>>(iter: I) -> Self {
        let mut tiers = ClaimedTiers::new();
        for rank in iter {
            tiers.insert(rank);
        }
        tiers
    }
}

impl fmt::Display for ClaimedTiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: Vec<String> = self.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", letters.join(","))
    }
}

impl FromStr for ClaimedTiers {
    type Err = AscentError;

    /// Parses the persisted form. Order and duplicates in the input do not
    /// matter; blank segments are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Rank::from_str)
            .collect()
    }
}

impl Serialize for ClaimedTiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClaimedTiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut tiers = ClaimedTiers::new();
        assert!(tiers.is_empty());
        assert!(tiers.insert(Rank::D));
        assert!(!tiers.insert(Rank::D));
        assert!(tiers.contains(Rank::D));
        assert!(!tiers.contains(Rank::C));
        assert_eq!(tiers.len(), 1);
    }

    #[test]
    fn test_iteration_is_ascending() {
        let tiers: ClaimedTiers = [Rank::C, Rank::F, Rank::E].into_iter().collect();
        assert_eq!(tiers.to_vec(), vec![Rank::F, Rank::E, Rank::C]);
        assert_eq!(tiers.highest(), Some(Rank::C));
    }

    #[test]
    fn test_canonical_string() {
        let tiers: ClaimedTiers = "D, F,E,,F".parse().unwrap();
        assert_eq!(tiers.to_string(), "F,E,D");
        assert_eq!("".parse::<ClaimedTiers>().unwrap(), ClaimedTiers::new());
    }

    #[test]
    fn test_invalid_symbol_rejected() {
        assert!("F,X".parse::<ClaimedTiers>().is_err());
    }

    #[test]
    fn test_serde_string_form() {
        let tiers: ClaimedTiers = [Rank::E, Rank::F].into_iter().collect();
        let json = serde_json::to_string(&tiers).unwrap();
        assert_eq!(json, "\"F,E\"");
        let parsed: ClaimedTiers = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tiers);
    }

    #[test]
    fn test_union() {
        let a: ClaimedTiers = [Rank::F].into_iter().collect();
        let b: ClaimedTiers = [Rank::E, Rank::F].into_iter().collect();
        assert_eq!(a.union(&b).to_vec(), vec![Rank::F, Rank::E]);
    }
}
