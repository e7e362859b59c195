//! # BarryLand client
//!
//! Favorites runtime for BarryLand clients. Favorites toggle instantly,
//! survive restarts while logged out, and are pushed to the server once a
//! session exists.
//!
//! ```no_run
//! use std::sync::Arc;
//! use barryland_client::{ClientConfig, FavoritesService, SessionBus};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let service = Arc::new(FavoritesService::from_config(&config)?);
//!
//! let bus = SessionBus::new();
//! tokio::spawn(service.clone().run(bus.subscribe()));
//!
//! let favorite = service.toggle_favorite("64b7f0c2a1d3e4f5a6b7c8d9").await?;
//! assert!(favorite);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod local_store;
pub mod remote;
pub mod service;
pub mod session;
pub mod storage;

pub use config::{ClientConfig, ConfigError};
pub use local_store::{LocalFavoriteStore, LOCAL_FAVORITES_KEY};
pub use remote::{FavoriteSource, HttpFavoriteSource};
pub use service::{FavoritesService, DEFAULT_RETRY_DELAY};
pub use session::{login, logout, session_token, SessionBus, SessionEvent, TOKEN_KEY};
pub use storage::{ClientStorage, FileStorage, KeyValueStorage, MemoryStorage};
