//! Outbox - favorites recorded locally and waiting for the server.
//!
//! Every entry carries a sync status so the retry contract is explicit:
//! `Pending` entries are picked up by the next sync, `Syncing` entries are
//! in flight, and `Dropped` entries were rejected by the server and are
//! never sent again (unless the user favorites the property anew).

use crate::{normalize_id, reconcile::SyncReport, snapshot::OutboxSnapshot, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sync status of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    /// Waiting for the next sync
    Pending,
    /// Sent, waiting for the server's answer
    Syncing,
    /// Rejected by the server (invalid id or unknown property)
    Dropped,
}

/// A locally recorded favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: PropertyId,
    pub status: OutboxStatus,
    /// Failed sync attempts so far
    #[serde(default)]
    pub attempts: u32,
}

impl OutboxEntry {
    /// Create a pending entry.
    pub fn pending(id: impl Into<PropertyId>) -> Self {
        Self {
            id: id.into(),
            status: OutboxStatus::Pending,
            attempts: 0,
        }
    }

    /// Whether the entry still counts as a local favorite.
    pub fn is_live(&self) -> bool {
        self.status != OutboxStatus::Dropped
    }
}

/// Ordered set of local favorites with per-entry sync status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    entries: Vec<OutboxEntry>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an outbox of pending entries from raw ids.
    ///
    /// Ids are trimmed; empty ids and duplicates are skipped.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outbox = Self::new();
        for id in ids {
            outbox.add(id.as_ref());
        }
        outbox
    }

    /// Restore from a persisted snapshot.
    ///
    /// Entries persisted mid-sync are treated as pending again.
    pub fn from_snapshot(snapshot: OutboxSnapshot) -> Self {
        let mut outbox = Self::new();
        for mut entry in snapshot.entries {
            let Some(id) = normalize_id(&entry.id) else {
                continue;
            };
            if outbox.position(&id).is_some() {
                continue;
            }
            entry.id = id;
            if entry.status == OutboxStatus::Syncing {
                entry.status = OutboxStatus::Pending;
            }
            outbox.entries.push(entry);
        }
        outbox
    }

    /// Export the entries worth persisting.
    ///
    /// Dropped entries only live for the current session.
    pub fn snapshot(&self) -> OutboxSnapshot {
        OutboxSnapshot::new(self.entries.iter().filter(|e| e.is_live()).cloned().collect())
    }

    /// All entries including dropped ones.
    pub fn entries(&self) -> &[OutboxEntry] {
        &self.entries
    }

    /// Get an entry by id.
    pub fn get(&self, id: &str) -> Option<&OutboxEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Ids of every live entry, in insertion order.
    pub fn ids(&self) -> Vec<PropertyId> {
        self.entries
            .iter()
            .filter(|e| e.is_live())
            .map(|e| e.id.clone())
            .collect()
    }

    /// Ids waiting for the next sync.
    pub fn pending_ids(&self) -> Vec<PropertyId> {
        self.with_status(OutboxStatus::Pending)
    }

    /// Ids with the given status.
    pub fn with_status(&self, status: OutboxStatus) -> Vec<PropertyId> {
        self.entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Check if a live entry exists for the id.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some_and(OutboxEntry::is_live)
    }

    /// Count of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_live()).count()
    }

    /// Check if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a local favorite.
    ///
    /// Returns `true` if the id was not already live. A dropped entry is
    /// revived as pending since the user asked for it again.
    pub fn add(&mut self, id: &str) -> bool {
        let Some(id) = normalize_id(id) else {
            return false;
        };
        match self.position(&id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                if entry.is_live() {
                    return false;
                }
                *entry = OutboxEntry::pending(id);
                true
            }
            None => {
                self.entries.push(OutboxEntry::pending(id));
                true
            }
        }
    }

    /// Forget a local favorite. Returns `true` if an entry was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(id) = normalize_id(id) else {
            return false;
        };
        match self.position(&id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pending ids the server does not already have.
    pub fn to_sync(&self, server_ids: &HashSet<&str>) -> Vec<PropertyId> {
        self.entries
            .iter()
            .filter(|e| e.status == OutboxStatus::Pending)
            .filter(|e| !server_ids.contains(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Mark entries as in flight.
    pub fn begin_sync(&mut self, ids: &[PropertyId]) {
        for entry in &mut self.entries {
            if entry.status == OutboxStatus::Pending && ids.contains(&entry.id) {
                entry.status = OutboxStatus::Syncing;
            }
        }
    }

    /// Apply the outcome of a sync round.
    ///
    /// Confirmed and already-present ids leave the outbox, rejected ids
    /// are dropped, retained ids go back to pending with one more attempt.
    pub fn settle(&mut self, report: &SyncReport) {
        self.entries.retain(|e| {
            !report.confirmed.contains(&e.id) && !report.already_present.contains(&e.id)
        });
        for entry in &mut self.entries {
            if report.rejected.contains(&entry.id) {
                entry.status = OutboxStatus::Dropped;
            } else if report.retained.contains(&entry.id) {
                entry.status = OutboxStatus::Pending;
                entry.attempts = entry.attempts.saturating_add(1);
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_A: &str = "64b7f0c2a1d3e4f5a6b7c8d9";
    const HEX_B: &str = "64b7f0c2a1d3e4f5a6b7c8da";

    #[test]
    fn add_has_set_semantics() {
        let mut outbox = Outbox::new();
        assert!(outbox.add(HEX_A));
        assert!(!outbox.add(HEX_A));
        assert!(!outbox.add(&format!(" {} ", HEX_A)));
        assert!(!outbox.add("   "));
        assert_eq!(outbox.ids(), vec![HEX_A.to_string()]);
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut outbox = Outbox::from_ids([HEX_A]);
        assert!(!outbox.remove(HEX_B));
        assert!(outbox.remove(HEX_A));
        assert!(outbox.is_empty());
    }

    #[test]
    fn hex_ids_match_regardless_of_case() {
        let mut outbox = Outbox::new();
        assert!(outbox.add(&HEX_A.to_uppercase()));
        assert!(!outbox.add(HEX_A));
        assert_eq!(outbox.ids(), vec![HEX_A.to_string()]);
        assert!(outbox.remove(&format!(" {} ", HEX_A.to_uppercase())));
        assert!(outbox.is_empty());
    }

    #[test]
    fn to_sync_skips_server_ids() {
        let outbox = Outbox::from_ids([HEX_A, HEX_B, "bad-id"]);
        let server: HashSet<&str> = [HEX_A].into_iter().collect();
        assert_eq!(
            outbox.to_sync(&server),
            vec![HEX_B.to_string(), "bad-id".to_string()]
        );
    }

    #[test]
    fn settle_applies_report() {
        let mut outbox = Outbox::from_ids([HEX_A, HEX_B, "bad-id", "1706745600000"]);
        outbox.begin_sync(&[
            HEX_B.to_string(),
            "bad-id".to_string(),
            "1706745600000".to_string(),
        ]);
        assert_eq!(outbox.get(HEX_B).unwrap().status, OutboxStatus::Syncing);
        assert_eq!(outbox.get(HEX_A).unwrap().status, OutboxStatus::Pending);

        let report = SyncReport {
            already_present: vec![HEX_A.to_string()],
            confirmed: vec![HEX_B.to_string()],
            rejected: vec!["bad-id".to_string()],
            retained: vec!["1706745600000".to_string()],
        };
        outbox.settle(&report);

        assert!(outbox.get(HEX_A).is_none());
        assert!(outbox.get(HEX_B).is_none());
        assert_eq!(outbox.get("bad-id").unwrap().status, OutboxStatus::Dropped);
        assert!(!outbox.contains("bad-id"));

        let retained = outbox.get("1706745600000").unwrap();
        assert_eq!(retained.status, OutboxStatus::Pending);
        assert_eq!(retained.attempts, 1);
        assert_eq!(outbox.ids(), vec!["1706745600000".to_string()]);
    }

    #[test]
    fn dropped_entries_are_not_persisted_and_can_be_revived() {
        let mut outbox = Outbox::from_ids(["bad-id"]);
        outbox.begin_sync(&["bad-id".to_string()]);
        outbox.settle(&SyncReport {
            rejected: vec!["bad-id".to_string()],
            ..SyncReport::default()
        });

        assert!(outbox.snapshot().entries.is_empty());
        assert!(outbox.pending_ids().is_empty());

        assert!(outbox.add("bad-id"));
        assert_eq!(outbox.pending_ids(), vec!["bad-id".to_string()]);
    }

    #[test]
    fn syncing_entries_restore_as_pending() {
        let mut outbox = Outbox::from_ids([HEX_A]);
        outbox.begin_sync(&[HEX_A.to_string()]);

        let restored = Outbox::from_snapshot(outbox.snapshot());
        assert_eq!(restored.get(HEX_A).unwrap().status, OutboxStatus::Pending);
    }
}
