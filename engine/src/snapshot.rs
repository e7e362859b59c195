//! Persisted form of the outbox.
//!
//! The store keeps a single JSON document. Older clients wrote a bare
//! array of id strings, which is still accepted on load.

use crate::{error::Result, outbox::OutboxEntry, Error};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time snapshot of the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Entries in insertion order
    pub entries: Vec<OutboxEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredForm {
    Versioned(OutboxSnapshot),
    Legacy(Vec<String>),
}

impl OutboxSnapshot {
    /// Create a snapshot of the current format version.
    pub fn new(entries: Vec<OutboxEntry>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            entries,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON, accepting the legacy id-array form.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredForm =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        let snapshot = match stored {
            StoredForm::Versioned(snapshot) => snapshot,
            StoredForm::Legacy(ids) => {
                Self::new(ids.into_iter().map(OutboxEntry::pending).collect())
            }
        };

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        Ok(snapshot)
    }
}
