//! Favorites service - ties the local store, the server and the state
//! together.
//!
//! All state changes go through [`FavoritesState::apply`] under one lock
//! that is never held across an `.await`, so each transition builds on the
//! latest state even when a sync round and a toggle interleave.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use barryland_engine::{
    error::Result, is_canonical_id, normalize_id, resolve_server_favorites, Action, Error,
    FavoritesState, Property, PropertyId, ServerFavorite, SyncDisposition, SyncReport,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::local_store::LocalFavoriteStore;
use crate::remote::{FavoriteSource, HttpFavoriteSource};
use crate::session::{session_token, SessionEvent};
use crate::storage::{ClientStorage, KeyValueStorage};

/// Default wait between a new local favorite and the passive sync attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Favorites for one client.
pub struct FavoritesService<R, S> {
    remote: R,
    storage: Arc<S>,
    local: LocalFavoriteStore<S>,
    state: Mutex<FavoritesState>,
    retry_delay: Duration,
}

impl FavoritesService<HttpFavoriteSource, ClientStorage> {
    /// Service over the HTTP API and the storage named by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let remote = HttpFavoriteSource::from_config(config)?;
        let storage = Arc::new(config.open_storage()?);
        tracing::debug!(api_url = %config.api_url, "Favorites service configured");
        Ok(Self::new(remote, storage).with_retry_delay(config.retry_delay))
    }
}

impl<R: FavoriteSource, S: KeyValueStorage> FavoritesService<R, S> {
    /// Create a service over a remote source and client storage.
    pub fn new(remote: R, storage: Arc<S>) -> Self {
        Self {
            remote,
            local: LocalFavoriteStore::new(storage.clone()),
            storage,
            state: Mutex::new(FavoritesState::new()),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set the wait before a passive sync of new local favorites.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Client storage holding the session token and local favorites.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// The local favorite store.
    pub fn local_store(&self) -> &LocalFavoriteStore<S> {
        &self.local
    }

    /// Copy of the current state.
    pub fn state(&self) -> FavoritesState {
        self.lock_state().clone()
    }

    /// Current favorites list.
    pub fn favorites(&self) -> Vec<Property> {
        self.lock_state().favorites().to_vec()
    }

    /// Whether a property is currently shown as favorite.
    pub fn is_favorite(&self, id: &str) -> bool {
        self.lock_state().is_favorite(id)
    }

    /// Replace the cached property lists.
    pub fn load_properties(&self, listing: Vec<Property>, own: Vec<Property>) {
        self.dispatch(Action::PropertiesLoaded { listing, own });
    }

    /// Refresh the favorites list.
    ///
    /// Without a session only local favorites are shown and the server is
    /// not contacted. Never fails: server errors fall back to local data.
    pub async fn fetch_favorites(&self) -> Vec<Property> {
        let Some(token) = self.token() else {
            return self.show_local_only();
        };

        match self.remote.current_favorites(&token).await {
            Ok(server) => {
                let pending = self.local.ids();
                let mut state = self.lock_state();
                let server = resolve_server_favorites(server, state.cache());
                state.apply(Action::SyncMerge { server, pending });
                state.favorites().to_vec()
            }
            Err(Error::Unauthorized) => {
                tracing::debug!("Session rejected, showing local favorites");
                self.show_local_only()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch favorites, showing local favorites");
                self.show_local_only()
            }
        }
    }

    /// Push favorites recorded before login to the server.
    ///
    /// `server` is the favorites snapshot that came with the login. Ids
    /// the server confirmed, already had, or rejected leave the local
    /// store; ids that failed transiently stay for a later attempt. Never
    /// fails.
    pub async fn sync_after_login(&self, server: Vec<ServerFavorite>) -> SyncReport {
        let server_ids: HashSet<PropertyId> = server.iter().map(|f| f.id().to_string()).collect();
        {
            let pending = self.local.ids();
            let mut state = self.lock_state();
            let server = resolve_server_favorites(server, state.cache());
            state.apply(Action::SyncMerge { server, pending });
        }

        let report = match self.token() {
            Some(token) => self.sync_round(&token, &server_ids).await,
            None => {
                tracing::warn!("Login event without a session token, keeping local favorites");
                SyncReport::default()
            }
        };

        self.fetch_favorites().await;
        report
    }

    /// Passive retry of pending local favorites.
    ///
    /// Returns `None` when there was nothing to do or the server could not
    /// be reached.
    pub async fn retry_pending(&self) -> Option<SyncReport> {
        let token = self.token()?;
        if self.local.pending_ids().is_empty() {
            return None;
        }

        let server = match self.remote.current_favorites(&token).await {
            Ok(server) => server,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping favorites retry");
                return None;
            }
        };
        let server_ids: HashSet<PropertyId> = server.iter().map(|f| f.id().to_string()).collect();

        let report = self.sync_round(&token, &server_ids).await;
        self.fetch_favorites().await;
        Some(report)
    }

    /// Toggle a favorite and return its new state.
    ///
    /// The change is visible immediately. Ids the server cannot know
    /// (non-canonical, or no session) stay local. A server refusal undoes
    /// the change and returns the error, except for an unknown property,
    /// which is kept locally.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let id = normalize_id(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;

        let (favorite, point) = {
            let mut state = self.lock_state();
            let favorite = !state.is_favorite(&id);
            let point = state.rollback_point(&id);
            state.apply(Action::ToggleOptimistic {
                id: id.clone(),
                favorite,
            });
            (favorite, point)
        };

        let token = match self.token() {
            Some(token) if is_canonical_id(&id) => token,
            _ => {
                tracing::debug!(id = %id, favorite, "Favorite kept locally");
                self.record_locally(&id, favorite);
                return Ok(favorite);
            }
        };

        match self.remote.toggle_favorite(&token, &id).await {
            Ok(response) => {
                let is_favorite = response.is_favorite;
                self.dispatch(Action::ToggleSettled {
                    id: id.clone(),
                    response,
                });
                if !is_favorite {
                    self.local.remove(&id);
                }
                Ok(is_favorite)
            }
            Err(e) if e.is_property_not_found() => {
                tracing::warn!(id = %id, "Unknown property, keeping favorite locally");
                self.record_locally(&id, favorite);
                Ok(favorite)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Favorite toggle failed, rolling back");
                self.dispatch(Action::ToggleRollback { point });
                Err(e)
            }
        }
    }

    /// Forget everything tied to the ended session.
    pub fn logout(&self) {
        self.local.clear();
        self.dispatch(Action::SessionCleared);
        tracing::info!("Favorites cleared for logout");
    }

    /// React to session events and new local favorites until the bus
    /// closes.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<SessionEvent>) {
        let mut added = self.local.subscribe();
        let mut retry_at: Option<Instant> = None;

        loop {
            let deadline = retry_at;
            let retry = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                event = events.recv() => match event {
                    Ok(SessionEvent::Login { favorites }) => {
                        let report = self.sync_after_login(favorites).await;
                        tracing::debug!(?report, "Login sync finished");
                        retry_at = self.next_retry();
                    }
                    Ok(SessionEvent::Logout) => {
                        retry_at = None;
                        self.logout();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed session events, refreshing favorites");
                        self.fetch_favorites().await;
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = added.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    retry_at = Some(Instant::now() + self.retry_delay);
                }
                _ = retry => {
                    self.retry_pending().await;
                    retry_at = self.next_retry();
                }
            }
        }

        tracing::debug!("Favorites event loop stopped");
    }

    async fn sync_round(&self, token: &str, server_ids: &HashSet<PropertyId>) -> SyncReport {
        let outbox = self.local.outbox();
        let server_refs: HashSet<&str> = server_ids.iter().map(String::as_str).collect();

        let mut report = SyncReport {
            already_present: outbox
                .pending_ids()
                .into_iter()
                .filter(|id| server_refs.contains(id.as_str()))
                .collect(),
            ..SyncReport::default()
        };

        let to_sync = outbox.to_sync(&server_refs);
        self.local.begin_sync(&to_sync);

        for id in to_sync {
            let mut result = self.remote.toggle_favorite(token, &id).await;
            if matches!(&result, Ok(response) if !response.is_favorite) {
                // The server already had it and the toggle removed it.
                result = self.remote.toggle_favorite(token, &id).await;
            }

            let disposition = SyncDisposition::for_result(&result);
            if let Err(e) = &result {
                tracing::debug!(id = %id, error = %e, ?disposition, "Local favorite not synced");
            }
            report.record(id, disposition);
        }

        self.local.settle(&report);
        if report.attempted() > 0 {
            tracing::info!(
                confirmed = report.confirmed.len(),
                rejected = report.rejected.len(),
                retained = report.retained.len(),
                "Local favorites synced"
            );
        }
        report
    }

    /// Deadline for the next passive retry, while a session exists and
    /// local favorites are still waiting.
    fn next_retry(&self) -> Option<Instant> {
        if self.token().is_some() && !self.local.pending_ids().is_empty() {
            Some(Instant::now() + self.retry_delay)
        } else {
            None
        }
    }

    fn show_local_only(&self) -> Vec<Property> {
        let pending = self.local.ids();
        let mut state = self.lock_state();
        state.apply(Action::SyncMerge {
            server: Vec::new(),
            pending,
        });
        state.favorites().to_vec()
    }

    fn record_locally(&self, id: &str, favorite: bool) {
        if favorite {
            self.local.add(id);
        } else {
            self.local.remove(id);
        }
    }

    fn token(&self) -> Option<String> {
        session_token(self.storage.as_ref())
    }

    fn dispatch(&self, action: Action) {
        self.lock_state().apply(action);
    }

    fn lock_state(&self) -> MutexGuard<'_, FavoritesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
