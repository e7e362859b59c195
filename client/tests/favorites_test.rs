//! Integration tests for the favorites service.
//!
//! The server side is an in-process mock so every scenario runs without a
//! network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use barryland_client::{
    ClientConfig, ClientStorage, FavoriteSource, FavoritesService, FileStorage, KeyValueStorage,
    MemoryStorage, SessionBus, SessionEvent, LOCAL_FAVORITES_KEY, TOKEN_KEY,
};
use barryland_engine::{
    error::Result, Error, OutboxStatus, Property, ServerFavorite, ToggleResponse,
    PROPERTY_NOT_FOUND_MESSAGE,
};

const HEX_A: &str = "64b7f0c2a1d3e4f5a6b7c8d9";
const HEX_B: &str = "64b7f0c2a1d3e4f5a6b7c8da";

#[derive(Default)]
struct MockState {
    favorites: Mutex<Vec<String>>,
    toggle_errors: Mutex<HashMap<String, Error>>,
    fetch_error: Mutex<Option<Error>>,
    fetches: AtomicUsize,
    toggles: AtomicUsize,
}

/// Remote source backed by an in-memory favorites list.
#[derive(Clone, Default)]
struct MockSource {
    state: Arc<MockState>,
}

impl MockSource {
    fn fail_toggle(&self, id: &str, error: Error) {
        self.state
            .toggle_errors
            .lock()
            .unwrap()
            .insert(id.to_string(), error);
    }

    fn heal_toggle(&self, id: &str) {
        self.state.toggle_errors.lock().unwrap().remove(id);
    }

    fn fail_fetch(&self, error: Error) {
        *self.state.fetch_error.lock().unwrap() = Some(error);
    }

    fn server_favorites(&self) -> Vec<String> {
        self.state.favorites.lock().unwrap().clone()
    }

    fn fetches(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }

    fn toggles(&self) -> usize {
        self.state.toggles.load(Ordering::SeqCst)
    }
}

impl FavoriteSource for MockSource {
    async fn current_favorites(&self, _token: &str) -> Result<Vec<ServerFavorite>> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.state.fetch_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self
            .server_favorites()
            .into_iter()
            .map(ServerFavorite::Id)
            .collect())
    }

    async fn toggle_favorite(&self, _token: &str, id: &str) -> Result<ToggleResponse> {
        self.state.toggles.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.state.toggle_errors.lock().unwrap().get(id) {
            return Err(error.clone());
        }

        let mut favorites = self.state.favorites.lock().unwrap();
        let is_favorite = match favorites.iter().position(|f| f == id) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(id.to_string());
                true
            }
        };
        Ok(ToggleResponse {
            is_favorite,
            favorites_count: None,
            property: None,
        })
    }
}

fn listing() -> Vec<Property> {
    let mut villa = Property::new(HEX_A, "Villa à Kipé");
    villa.favorites = 3;
    vec![villa, Property::new(HEX_B, "Studio Ratoma")]
}

fn setup(logged_in: bool) -> (
    Arc<FavoritesService<MockSource, MemoryStorage>>,
    MockSource,
    Arc<MemoryStorage>,
) {
    let storage = Arc::new(MemoryStorage::new());
    if logged_in {
        storage.set(TOKEN_KEY, "jwt-token").unwrap();
    }
    let remote = MockSource::default();
    let service = FavoritesService::new(remote.clone(), storage.clone())
        .with_retry_delay(Duration::from_millis(20));
    service.load_properties(listing(), vec![]);
    (Arc::new(service), remote, storage)
}

fn cached(service: &FavoritesService<MockSource, MemoryStorage>, id: &str) -> Property {
    service.state().cache().find(id).cloned().unwrap()
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

// ============================================================================
// Toggle
// ============================================================================

#[tokio::test]
async fn toggle_on_then_off_restores_property() {
    let (service, remote, _) = setup(true);

    assert!(service.toggle_favorite(HEX_A).await.unwrap());
    let villa = cached(&service, HEX_A);
    assert!(villa.is_favorite);
    assert_eq!(villa.favorites, 4);
    assert_eq!(service.favorites().len(), 1);
    assert_eq!(remote.server_favorites(), vec![HEX_A.to_string()]);

    assert!(!service.toggle_favorite(HEX_A).await.unwrap());
    let villa = cached(&service, HEX_A);
    assert!(!villa.is_favorite);
    assert_eq!(villa.favorites, 3);
    assert!(service.favorites().is_empty());
    assert!(remote.server_favorites().is_empty());
}

#[tokio::test]
async fn unknown_property_is_kept_locally() {
    let (service, remote, _) = setup(true);
    remote.fail_toggle(HEX_A, Error::from_status(404, PROPERTY_NOT_FOUND_MESSAGE));

    assert!(service.toggle_favorite(HEX_A).await.unwrap());

    assert!(service.is_favorite(HEX_A));
    assert!(cached(&service, HEX_A).is_favorite);
    assert!(service.local_store().contains(HEX_A));
}

#[tokio::test]
async fn server_failure_rolls_back() {
    let (service, remote, _) = setup(true);
    remote.fail_toggle(
        HEX_A,
        Error::Server {
            status: 500,
            message: "Erreur serveur".into(),
        },
    );

    let err = service.toggle_favorite(HEX_A).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let villa = cached(&service, HEX_A);
    assert!(!villa.is_favorite);
    assert_eq!(villa.favorites, 3);
    assert!(service.favorites().is_empty());
    assert!(!service.local_store().contains(HEX_A));
}

#[tokio::test]
async fn rollback_keeps_position_in_favorites() {
    let (service, remote, _) = setup(true);
    service.toggle_favorite(HEX_A).await.unwrap();
    service.toggle_favorite(HEX_B).await.unwrap();

    remote.fail_toggle(HEX_A, Error::Network("connection reset".into()));
    assert!(service.toggle_favorite(HEX_A).await.is_err());

    let ids: Vec<_> = service.favorites().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![HEX_A.to_string(), HEX_B.to_string()]);
}

#[tokio::test]
async fn server_unfavorite_removes_local_entry() {
    let (service, remote, _) = setup(true);
    service.local_store().add(HEX_A);
    remote.state.favorites.lock().unwrap().push(HEX_A.to_string());

    // Shown as not favorite, but the server has it: the toggle removes it.
    assert!(!service.toggle_favorite(HEX_A).await.unwrap());

    assert!(!service.local_store().contains(HEX_A));
    assert!(!service.is_favorite(HEX_A));
    assert!(remote.server_favorites().is_empty());
}

#[tokio::test]
async fn anonymous_toggle_stays_local() {
    let (service, remote, _) = setup(false);

    assert!(service.toggle_favorite(HEX_A).await.unwrap());
    assert!(service.toggle_favorite("1706745600000").await.unwrap());

    assert_eq!(remote.toggles(), 0);
    assert_eq!(
        service.local_store().ids(),
        vec![HEX_A.to_string(), "1706745600000".to_string()]
    );

    assert!(!service.toggle_favorite(HEX_A).await.unwrap());
    assert_eq!(service.local_store().ids(), vec!["1706745600000".to_string()]);
}

#[tokio::test]
async fn non_canonical_id_skips_server_with_session() {
    let (service, remote, _) = setup(true);

    assert!(service.toggle_favorite("draft-42").await.unwrap());

    assert_eq!(remote.toggles(), 0);
    assert!(service.local_store().contains("draft-42"));
    assert!(service.favorites()[0].is_placeholder());
}

#[tokio::test]
async fn blank_id_is_rejected() {
    let (service, _, _) = setup(true);
    assert!(matches!(
        service.toggle_favorite("   ").await,
        Err(Error::InvalidId(_))
    ));
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn anonymous_fetch_makes_no_request() {
    let (service, remote, _) = setup(false);
    service.toggle_favorite(HEX_B).await.unwrap();

    let favorites = service.fetch_favorites().await;

    assert_eq!(remote.fetches(), 0);
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].title, "Studio Ratoma");
    assert!(favorites[0].is_favorite);
}

#[tokio::test]
async fn fetch_merges_server_and_local() {
    let (service, remote, storage) = setup(false);
    service.toggle_favorite("1706745600000").await.unwrap();
    remote.state.favorites.lock().unwrap().push(HEX_A.to_string());
    storage.set(TOKEN_KEY, "jwt-token").unwrap();

    let favorites = service.fetch_favorites().await;

    let ids: Vec<_> = favorites.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![HEX_A, "1706745600000"]);
    assert!(favorites.iter().all(|p| p.is_favorite));
    assert!(cached(&service, HEX_A).is_favorite);
    assert!(!cached(&service, HEX_B).is_favorite);
}

#[tokio::test]
async fn rejected_session_falls_back_to_local() {
    let (service, remote, _) = setup(true);
    remote.fail_fetch(Error::Unauthorized);
    service.local_store().add(HEX_B);

    let favorites = service.fetch_favorites().await;

    assert_eq!(remote.fetches(), 1);
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, HEX_B);
}

#[tokio::test]
async fn server_error_on_fetch_falls_back_to_local() {
    let (service, remote, _) = setup(true);
    remote.fail_fetch(Error::Server {
        status: 500,
        message: "Erreur serveur".into(),
    });
    service.local_store().add(HEX_B);

    let favorites = service.fetch_favorites().await;

    assert_eq!(remote.fetches(), 1);
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, HEX_B);
    assert!(favorites[0].is_favorite);
}

#[tokio::test]
async fn network_error_on_fetch_falls_back_to_local() {
    let (service, remote, _) = setup(true);
    remote.fail_fetch(Error::Network("connection refused".into()));
    service.local_store().add("1706745600000");

    let favorites = service.fetch_favorites().await;

    assert_eq!(remote.fetches(), 1);
    let ids: Vec<_> = favorites.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1706745600000"]);
}

// ============================================================================
// Login Sync
// ============================================================================

#[tokio::test]
async fn login_sync_clears_confirmed_and_rejected() {
    let (service, remote, storage) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();
    service.toggle_favorite("bad-id").await.unwrap();
    remote.fail_toggle(
        "bad-id",
        Error::from_status(400, "Identifiant de propriété invalide"),
    );

    storage.set(TOKEN_KEY, "jwt-token").unwrap();
    let report = service.sync_after_login(vec![]).await;

    assert_eq!(report.confirmed, vec![HEX_A.to_string()]);
    assert_eq!(report.rejected, vec!["bad-id".to_string()]);
    assert!(report.is_complete());
    assert!(service.local_store().ids().is_empty());
    assert_eq!(remote.server_favorites(), vec![HEX_A.to_string()]);

    let ids: Vec<_> = service.favorites().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![HEX_A.to_string()]);
}

#[tokio::test]
async fn login_sync_skips_ids_the_server_has() {
    let (service, remote, storage) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();
    remote.state.favorites.lock().unwrap().push(HEX_A.to_string());

    storage.set(TOKEN_KEY, "jwt-token").unwrap();
    let report = service
        .sync_after_login(vec![ServerFavorite::Id(HEX_A.to_string())])
        .await;

    assert_eq!(report.already_present, vec![HEX_A.to_string()]);
    assert_eq!(remote.toggles(), 0);
    assert!(service.local_store().ids().is_empty());
    assert_eq!(remote.server_favorites(), vec![HEX_A.to_string()]);
}

#[tokio::test]
async fn login_sync_retains_transient_failures() {
    let (service, remote, storage) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();
    remote.fail_toggle(
        HEX_A,
        Error::Server {
            status: 503,
            message: "Service indisponible".into(),
        },
    );

    storage.set(TOKEN_KEY, "jwt-token").unwrap();
    let report = service.sync_after_login(vec![]).await;

    assert_eq!(report.retained, vec![HEX_A.to_string()]);
    let outbox = service.local_store().outbox();
    let entry = outbox.get(HEX_A).unwrap();
    assert_eq!(entry.status, OutboxStatus::Pending);
    assert_eq!(entry.attempts, 1);
    assert!(service.is_favorite(HEX_A));

    remote.heal_toggle(HEX_A);
    let report = service.retry_pending().await.unwrap();
    assert_eq!(report.confirmed, vec![HEX_A.to_string()]);
    assert!(service.local_store().ids().is_empty());
}

#[tokio::test]
async fn retry_without_session_does_nothing() {
    let (service, remote, _) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();

    assert!(service.retry_pending().await.is_none());
    assert_eq!(remote.fetches(), 0);
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn logout_purges_local_favorites() {
    let (service, _, storage) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();
    service.toggle_favorite("1706745600000").await.unwrap();

    service.logout();

    assert!(service.local_store().ids().is_empty());
    assert!(service.favorites().is_empty());
    assert!(!cached(&service, HEX_A).is_favorite);
    assert_eq!(storage.get(LOCAL_FAVORITES_KEY).unwrap(), None);
}

// ============================================================================
// Event Loop
// ============================================================================

#[tokio::test]
async fn session_events_drive_sync_and_logout() {
    let (service, remote, storage) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();

    let bus = SessionBus::new();
    let handle = tokio::spawn(service.clone().run(bus.subscribe()));

    storage.set(TOKEN_KEY, "jwt-token").unwrap();
    bus.publish(SessionEvent::Login { favorites: vec![] });
    wait_for(|| remote.server_favorites() == vec![HEX_A.to_string()]).await;
    wait_for(|| service.local_store().ids().is_empty()).await;
    assert!(service.is_favorite(HEX_A));

    storage.remove(TOKEN_KEY).unwrap();
    bus.publish(SessionEvent::Logout);
    wait_for(|| service.favorites().is_empty()).await;

    drop(bus);
    handle.await.unwrap();
}

#[tokio::test]
async fn new_local_favorite_is_retried_passively() {
    let (service, remote, _) = setup(true);
    remote.fail_toggle(HEX_A, Error::from_status(404, PROPERTY_NOT_FOUND_MESSAGE));

    let bus = SessionBus::new();
    let handle = tokio::spawn(service.clone().run(bus.subscribe()));
    tokio::task::yield_now().await;

    assert!(service.toggle_favorite(HEX_A).await.unwrap());
    assert!(service.local_store().contains(HEX_A));

    // The property now exists on the server.
    remote.heal_toggle(HEX_A);
    wait_for(|| remote.server_favorites() == vec![HEX_A.to_string()]).await;
    wait_for(|| service.local_store().ids().is_empty()).await;
    assert!(service.is_favorite(HEX_A));

    drop(bus);
    handle.await.unwrap();
}

#[tokio::test]
async fn retained_favorites_are_retried_until_synced() {
    let (service, remote, storage) = setup(false);
    service.toggle_favorite(HEX_A).await.unwrap();
    remote.fail_toggle(
        HEX_A,
        Error::Server {
            status: 503,
            message: "Service indisponible".into(),
        },
    );

    let bus = SessionBus::new();
    let handle = tokio::spawn(service.clone().run(bus.subscribe()));

    storage.set(TOKEN_KEY, "jwt-token").unwrap();
    bus.publish(SessionEvent::Login { favorites: vec![] });
    wait_for(|| remote.toggles() >= 1).await;
    assert!(service.local_store().contains(HEX_A));

    // No new local id arrives; the loop must come back on its own.
    remote.heal_toggle(HEX_A);
    wait_for(|| remote.server_favorites() == vec![HEX_A.to_string()]).await;
    wait_for(|| service.local_store().ids().is_empty()).await;

    drop(bus);
    handle.await.unwrap();
}

#[tokio::test]
async fn failed_retry_fetch_is_attempted_again() {
    let (service, remote, _) = setup(true);
    remote.fail_fetch(Error::Network("connection refused".into()));

    let bus = SessionBus::new();
    let handle = tokio::spawn(service.clone().run(bus.subscribe()));
    tokio::task::yield_now().await;

    service.local_store().add(HEX_A);
    wait_for(|| remote.fetches() >= 2).await;
    assert_eq!(remote.toggles(), 0);

    *remote.state.fetch_error.lock().unwrap() = None;
    wait_for(|| remote.server_favorites() == vec![HEX_A.to_string()]).await;
    wait_for(|| service.local_store().ids().is_empty()).await;

    drop(bus);
    handle.await.unwrap();
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn service_from_config_persists_to_storage_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        storage_dir: Some(dir.path().to_path_buf()),
        retry_delay: Duration::from_secs(5),
        ..ClientConfig::default()
    };

    let service = FavoritesService::from_config(&config).unwrap();
    assert!(matches!(service.storage().as_ref(), ClientStorage::File(_)));

    // Logged out: stays local and reaches the disk without any request.
    assert!(service.toggle_favorite(HEX_A).await.unwrap());
    let reopened = FileStorage::open(dir.path()).unwrap();
    let saved = reopened.get(LOCAL_FAVORITES_KEY).unwrap().unwrap();
    assert!(saved.contains(HEX_A));
}
