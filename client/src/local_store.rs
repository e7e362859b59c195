//! Local favorite store.
//!
//! Persists the outbox of favorites the server has not confirmed yet and
//! keeps an in-memory mirror so readers never hit storage. Storage
//! failures are logged and swallowed: favoriting keeps working for the
//! current session, it just does not survive a restart.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use barryland_engine::{Outbox, OutboxSnapshot, PropertyId, SyncReport};
use tokio::sync::watch;

use crate::storage::KeyValueStorage;

/// Storage key of the persisted outbox.
pub const LOCAL_FAVORITES_KEY: &str = "localFavorites";

/// Local favorites backed by key-value storage.
pub struct LocalFavoriteStore<S> {
    storage: Arc<S>,
    mirror: Mutex<Outbox>,
    revision: watch::Sender<u64>,
}

impl<S: KeyValueStorage> LocalFavoriteStore<S> {
    /// Open the store and load whatever is persisted.
    pub fn new(storage: Arc<S>) -> Self {
        let (revision, _) = watch::channel(0);
        let store = Self {
            storage,
            mirror: Mutex::new(Outbox::new()),
            revision,
        };
        store.load();
        store
    }

    /// Read the persisted ids, refreshing the mirror.
    ///
    /// Missing or malformed data reads as empty. When storage itself is
    /// unavailable the mirror is kept and returned as is.
    pub fn load(&self) -> Vec<PropertyId> {
        let mut mirror = self.mirror();
        if let Some(outbox) = self.read_storage() {
            *mirror = outbox;
        }
        mirror.ids()
    }

    /// Replace the stored ids.
    pub fn save<I, T>(&self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let outbox = Outbox::from_ids(ids);
        self.write_storage(&outbox);
        *self.mirror() = outbox;
    }

    /// Record a favorite. No-op if already present.
    pub fn add(&self, id: &str) {
        let added = {
            let mut mirror = self.mirror();
            let added = mirror.add(id);
            if added {
                self.write_storage(&mirror);
            }
            added
        };
        if added {
            self.revision.send_modify(|r| *r += 1);
        }
    }

    /// Forget a favorite. No-op if absent.
    pub fn remove(&self, id: &str) {
        let mut mirror = self.mirror();
        if mirror.remove(id) {
            self.write_storage(&mirror);
        }
    }

    /// Forget every favorite.
    pub fn clear(&self) {
        self.mirror().clear();
        if let Err(e) = self.storage.remove(LOCAL_FAVORITES_KEY) {
            tracing::warn!(error = %e, "Failed to clear local favorites");
        }
    }

    /// Live ids from the mirror.
    pub fn ids(&self) -> Vec<PropertyId> {
        self.mirror().ids()
    }

    /// Ids waiting for a sync.
    pub fn pending_ids(&self) -> Vec<PropertyId> {
        self.mirror().pending_ids()
    }

    /// Whether the id is stored locally.
    pub fn contains(&self, id: &str) -> bool {
        self.mirror().contains(id)
    }

    /// Copy of the mirror, statuses included.
    pub fn outbox(&self) -> Outbox {
        self.mirror().clone()
    }

    /// Mark ids as in flight.
    pub fn begin_sync(&self, ids: &[PropertyId]) {
        let mut mirror = self.mirror();
        mirror.begin_sync(ids);
        self.write_storage(&mirror);
    }

    /// Apply the outcome of a sync round and persist it.
    pub fn settle(&self, report: &SyncReport) {
        let mut mirror = self.mirror();
        mirror.settle(report);
        self.write_storage(&mirror);
    }

    /// Receiver notified whenever a new id is recorded.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn mirror(&self) -> MutexGuard<'_, Outbox> {
        self.mirror.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_storage(&self) -> Option<Outbox> {
        let raw = match self.storage.get(LOCAL_FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(Outbox::new()),
            Err(e) => {
                tracing::warn!(error = %e, "Local favorites unavailable");
                return None;
            }
        };

        match OutboxSnapshot::from_json(&raw) {
            Ok(snapshot) => Some(Outbox::from_snapshot(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed local favorites");
                Some(Outbox::new())
            }
        }
    }

    fn write_storage(&self, outbox: &Outbox) {
        let result = outbox
            .snapshot()
            .to_json()
            .and_then(|json| self.storage.set(LOCAL_FAVORITES_KEY, &json));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist local favorites");
        }
    }
}
