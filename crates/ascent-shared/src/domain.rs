//! Skill domains and the fixed percentage split of challenge XP across them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AscentError, Result};

/// A top-level skill category each athlete levels independently
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Domain {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One domain's percentage of a challenge's XP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainShare {
    pub domain: Domain,
    pub pct: u8,
}

impl DomainShare {
    pub fn new(domain: impl Into<Domain>, pct: u8) -> Self {
        Self {
            domain: domain.into(),
            pct,
        }
    }

    /// XP this share receives from `amount` (floored)
    pub fn portion(&self, amount: u64) -> u64 {
        amount.saturating_mul(self.pct as u64) / 100
    }
}

/// Primary/secondary/tertiary XP distribution for a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpSplit {
    pub primary: DomainShare,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<DomainShare>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tertiary: Option<DomainShare>,
}

impl XpSplit {
    /// Everything to one domain
    pub fn single(domain: impl Into<Domain>) -> Self {
        Self {
            primary: DomainShare::new(domain, 100),
            secondary: None,
            tertiary: None,
        }
    }

    pub fn with_secondary(mut self, domain: impl Into<Domain>, pct: u8) -> Self {
        self.secondary = Some(DomainShare::new(domain, pct));
        self
    }

    pub fn with_tertiary(mut self, domain: impl Into<Domain>, pct: u8) -> Self {
        self.tertiary = Some(DomainShare::new(domain, pct));
        self
    }

    pub fn primary_domain(&self) -> &Domain {
        &self.primary.domain
    }

    pub fn shares(&self) -> impl Iterator<Item = &DomainShare> {
        std::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .chain(self.tertiary.as_ref())
    }

    pub fn total_pct(&self) -> u32 {
        self.shares().map(|s| s.pct as u32).sum()
    }

    /// Percentages must sum to at most 100
    pub fn validate(&self) -> Result<()> {
        let total = self.total_pct();
        if total > 100 {
            return Err(AscentError::InvalidSplit(format!(
                "percentages sum to {} (max 100)",
                total
            )));
        }
        Ok(())
    }

    /// Per-domain XP for an award. A domain named twice gets both portions.
    /// Zero portions are dropped.
    pub fn distribute(&self, amount: u64) -> Vec<(Domain, u64)> {
        let mut out: Vec<(Domain, u64)> = Vec::new();
        for share in self.shares() {
            let portion = share.portion(amount);
            if portion == 0 {
                continue;
            }
            match out.iter_mut().find(|(d, _)| *d == share.domain) {
                Some((_, xp)) => *xp += portion,
                None => out.push((share.domain.clone(), portion)),
            }
        }
        out
    }
}
