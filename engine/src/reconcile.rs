//! Reconciliation of local and server favorites.
//!
//! This module only plans: it computes merged lists and classifies sync
//! outcomes. Calling the server and persisting the outbox is left to the
//! client runtime.
//!
//! # Merge
//!
//! 1. Server favorites are authoritative and come first, deduplicated
//! 2. Local ids the server does not have are appended, resolved against
//!    the property cache (placeholders for unknown ids)
//! 3. Every entry in the result is flagged as favorite

use crate::{
    error::Result, Error, Property, PropertyCache, PropertyId, ServerFavorite, ToggleResponse,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ids of a favorites list as a lookup set.
pub fn id_set(favorites: &[Property]) -> HashSet<&str> {
    favorites.iter().map(|p| p.id.as_str()).collect()
}

/// Turn the server's favorites payload into display records.
///
/// Bare ids are resolved against the cache, populated objects are taken
/// as they are. Duplicates keep their first occurrence.
pub fn resolve_server_favorites(
    server: Vec<ServerFavorite>,
    cache: &PropertyCache,
) -> Vec<Property> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(server.len());
    for favorite in server {
        if !seen.insert(favorite.id().to_string()) {
            continue;
        }
        let mut property = match favorite {
            ServerFavorite::Id(id) => cache.resolve(&id),
            ServerFavorite::Property(property) => property,
        };
        property.is_favorite = true;
        resolved.push(property);
    }
    resolved
}

/// Merge the authoritative server list with locally pending ids.
///
/// The result never contains the same id twice.
pub fn merge_favorites(
    server: Vec<Property>,
    pending: &[PropertyId],
    cache: &PropertyCache,
) -> Vec<Property> {
    let mut seen: HashSet<String> = HashSet::with_capacity(server.len() + pending.len());
    let mut merged = Vec::with_capacity(server.len() + pending.len());

    for mut property in server {
        if seen.insert(property.id.clone()) {
            property.is_favorite = true;
            merged.push(property);
        }
    }

    for id in pending {
        if seen.insert(id.clone()) {
            merged.push(cache.resolve(id));
        }
    }

    merged
}

/// Local ids the server does not already have.
pub fn ids_to_sync(local: &[PropertyId], server_ids: &HashSet<&str>) -> Vec<PropertyId> {
    let mut seen = HashSet::new();
    let mut to_sync = Vec::new();
    for id in local {
        if !server_ids.contains(id.as_str()) && seen.insert(id.as_str()) {
            to_sync.push(id.clone());
        }
    }
    to_sync
}

/// What to do with an outbox entry after one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncDisposition {
    /// The server recorded the favorite
    Confirmed,
    /// The server will never accept it (invalid id, unknown property)
    Rejected,
    /// Transient failure, try again later
    Retained,
}

impl SyncDisposition {
    /// Classify a failed attempt.
    pub fn for_error(error: &Error) -> Self {
        match error {
            Error::InvalidId(_) | Error::NotFound { .. } => SyncDisposition::Rejected,
            e if e.is_transient() => SyncDisposition::Retained,
            // Anything else is a 4xx the same request will hit again.
            Error::Server { .. } => SyncDisposition::Rejected,
            _ => SyncDisposition::Retained,
        }
    }

    /// Classify the result of a registration attempt.
    pub fn for_result(result: &Result<ToggleResponse>) -> Self {
        match result {
            Ok(_) => SyncDisposition::Confirmed,
            Err(e) => Self::for_error(e),
        }
    }
}

/// Outcome of a sync round, per id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Local ids the server already had before the round
    pub already_present: Vec<PropertyId>,
    /// Ids the server accepted during the round
    pub confirmed: Vec<PropertyId>,
    /// Ids dropped for good
    pub rejected: Vec<PropertyId>,
    /// Ids kept for a later attempt
    pub retained: Vec<PropertyId>,
}

impl SyncReport {
    /// Record the disposition of one id.
    pub fn record(&mut self, id: impl Into<PropertyId>, disposition: SyncDisposition) {
        let id = id.into();
        match disposition {
            SyncDisposition::Confirmed => self.confirmed.push(id),
            SyncDisposition::Rejected => self.rejected.push(id),
            SyncDisposition::Retained => self.retained.push(id),
        }
    }

    /// Number of ids attempted during the round.
    pub fn attempted(&self) -> usize {
        self.confirmed.len() + self.rejected.len() + self.retained.len()
    }

    /// True when nothing needs another attempt.
    pub fn is_complete(&self) -> bool {
        self.retained.is_empty()
    }
}
