//! XP transaction ledger.
//!
//! Append-only audit trail of XP grants. Rows are inserted on award and
//! removed on reversal or reconciliation cleanup, never edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::athlete::AthleteId;
use crate::domain::Domain;

/// Where an XP grant came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    /// Tier claims on a challenge submission; `source_id` is the submission
    Challenge,
    /// Manual grant by staff; never touched by reconciliation
    Adjustment,
}

/// Single ledger row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct XpTransaction {
    pub id: Uuid,
    pub athlete_id: AthleteId,
    pub domain: Domain,
    pub amount: u64,
    pub source: XpSource,
    pub source_id: Uuid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl XpTransaction {
    pub fn new(athlete_id: AthleteId, domain: Domain, amount: u64, source: XpSource, source_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            athlete_id,
            domain,
            amount,
            source,
            source_id,
            note: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn is_from(&self, source: XpSource, source_id: Uuid) -> bool {
        self.source == source && self.source_id == source_id
    }
}

/// In-memory ledger for one store
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct XpLedger {
    pub entries: Vec<XpTransaction>,
}

impl XpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: XpTransaction) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = XpTransaction>) {
        self.entries.extend(entries);
    }

    /// Remove rows by id. Returns how many were removed.
    pub fn remove_ids(&mut self, ids: &[Uuid]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.id));
        before - self.entries.len()
    }

    pub fn for_athlete(&self, athlete_id: AthleteId) -> impl Iterator<Item = &XpTransaction> {
        self.entries.iter().filter(move |e| e.athlete_id == athlete_id)
    }

    /// Rows written for one source record
    pub fn for_source(&self, source: XpSource, source_id: Uuid) -> impl Iterator<Item = &XpTransaction> {
        self.entries.iter().filter(move |e| e.is_from(source, source_id))
    }

    pub fn summary(&self, athlete_id: AthleteId) -> LedgerSummary {
        let mut summary = LedgerSummary::default();
        for entry in self.for_athlete(athlete_id) {
            summary.total += 1;
            summary.xp = summary.xp.saturating_add(entry.amount);
            match entry.source {
                XpSource::Challenge => summary.challenge += 1,
                XpSource::Adjustment => summary.adjustment += 1,
            }
        }
        summary
    }
}

/// Summary of one athlete's ledger rows
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: usize,
    pub challenge: usize,
    pub adjustment: usize,
    pub xp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_new() {
        let ledger = XpLedger::new();
        assert!(ledger.entries.is_empty());
    }

    #[test]
    fn test_ledger_filters() {
        let athlete = Uuid::from_u128(1);
        let other = Uuid::from_u128(2);
        let sub = Uuid::from_u128(10);
        let mut ledger = XpLedger::new();
        ledger.append(XpTransaction::new(athlete, Domain::new("strength"), 100, XpSource::Challenge, sub));
        ledger.append(XpTransaction::new(athlete, Domain::new("endurance"), 50, XpSource::Challenge, sub));
        ledger.append(
            XpTransaction::new(athlete, Domain::new("strength"), 20, XpSource::Adjustment, Uuid::nil())
                .with_note("event bonus"),
        );
        ledger.append(XpTransaction::new(other, Domain::new("strength"), 5, XpSource::Challenge, Uuid::nil()));

        assert_eq!(ledger.for_athlete(athlete).count(), 3);
        assert_eq!(ledger.for_source(XpSource::Challenge, sub).count(), 2);

        let summary = ledger.summary(athlete);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.challenge, 2);
        assert_eq!(summary.adjustment, 1);
        assert_eq!(summary.xp, 170);
    }

    #[test]
    fn test_remove_ids() {
        let mut ledger = XpLedger::new();
        let entry = XpTransaction::new(Uuid::nil(), Domain::new("s"), 1, XpSource::Challenge, Uuid::nil());
        let id = entry.id;
        ledger.append(entry);
        assert_eq!(ledger.remove_ids(&[id]), 1);
        assert_eq!(ledger.remove_ids(&[id]), 0);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = XpTransaction::new(Uuid::nil(), Domain::new("strength"), 75, XpSource::Challenge, Uuid::nil());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"source\":\"challenge\""));
        assert!(!json.contains("note"));
        let parsed: XpTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
