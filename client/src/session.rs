//! Session events and token lookup.
//!
//! The session side of the app announces logins and logouts on a
//! [`SessionBus`]; the favorites side subscribes to it instead of relying
//! on process-wide callbacks.

use barryland_engine::ServerFavorite;
use tokio::sync::broadcast;

use crate::storage::KeyValueStorage;

/// Storage key of the session token.
pub const TOKEN_KEY: &str = "token";

/// Capacity of the event channel. Slow subscribers that fall further
/// behind than this see a lag and resynchronize.
const EVENT_CAPACITY: usize = 32;

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A user logged in; carries the server's favorites snapshot
    Login { favorites: Vec<ServerFavorite> },
    /// The user logged out
    Logout,
}

/// Broadcast channel of session events.
#[derive(Debug, Clone)]
pub struct SessionBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns how many subscribers received it.
    pub fn publish(&self, event: SessionEvent) -> usize {
        match self.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                tracing::debug!("Session event published with no subscribers");
                0
            }
        }
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Current session token, if any.
///
/// Storage errors read as "no session" so callers fall back to local-only
/// behavior.
pub fn session_token<S: KeyValueStorage + ?Sized>(storage: &S) -> Option<String> {
    match storage.get(TOKEN_KEY) {
        Ok(Some(token)) if !token.trim().is_empty() => Some(token.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Session token unavailable");
            None
        }
    }
}

/// Store the token and announce the login.
pub fn login<S: KeyValueStorage + ?Sized>(
    storage: &S,
    bus: &SessionBus,
    token: &str,
    favorites: Vec<ServerFavorite>,
) -> barryland_engine::error::Result<()> {
    storage.set(TOKEN_KEY, token)?;
    tracing::info!(favorites = favorites.len(), "Session started");
    bus.publish(SessionEvent::Login { favorites });
    Ok(())
}

/// Drop the token and announce the logout.
pub fn logout<S: KeyValueStorage + ?Sized>(
    storage: &S,
    bus: &SessionBus,
) -> barryland_engine::error::Result<()> {
    storage.remove(TOKEN_KEY)?;
    tracing::info!("Session ended");
    bus.publish(SessionEvent::Logout);
    Ok(())
}
