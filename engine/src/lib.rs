//! # BarryLand Engine
//!
//! The favorites core of the BarryLand real-estate marketplace.
//!
//! This crate holds the logic that keeps a user's favorite properties
//! consistent between what was recorded locally (before login, or for ids
//! the server does not know) and what the server has persisted. It plans
//! merges and sync rounds and applies state transitions; it never talks to
//! the network or to storage.
//!
//! ## Design Principles
//!
//! - **No IO**: storage and HTTP live in `barryland-client`
//! - **Pure transitions**: every state change is an [`Action`] applied by
//!   [`FavoritesState::apply`]
//! - **Explicit retry contract**: locally recorded favorites live in an
//!   [`Outbox`] with a per-entry [`OutboxStatus`]
//!
//! ## Core Concepts
//!
//! ### Properties
//!
//! A [`Property`] is identified by a string id. Server-issued ids are 24
//! hexadecimal characters ([`is_canonical_id`]); anything else is a
//! client-only placeholder.
//!
//! ### Favorites State
//!
//! [`FavoritesState`] holds the [`PropertyCache`] and the favorites list:
//! - [`Action::ToggleOptimistic`] - apply a toggle before the server answers
//! - [`Action::ToggleSettled`] - take the server's answer
//! - [`Action::ToggleRollback`] - undo a refused toggle
//! - [`Action::SyncMerge`] - server favorites plus pending local ids
//!
//! ### Reconciliation
//!
//! [`merge_favorites`] merges server and local favorites without
//! duplicates. [`SyncDisposition`] decides whether a failed sync attempt
//! is retried or dropped.
//!
//! ## Quick Start
//!
//! ```rust
//! use barryland_engine::{Action, FavoritesState, Property};
//!
//! let mut state = FavoritesState::new();
//! state.apply(Action::PropertiesLoaded {
//!     listing: vec![Property::new("64b7f0c2a1d3e4f5a6b7c8d9", "Villa à Kipé")],
//!     own: vec![],
//! });
//!
//! let point = state.rollback_point("64b7f0c2a1d3e4f5a6b7c8d9");
//! state.apply(Action::ToggleOptimistic {
//!     id: "64b7f0c2a1d3e4f5a6b7c8d9".to_string(),
//!     favorite: true,
//! });
//! assert!(state.is_favorite("64b7f0c2a1d3e4f5a6b7c8d9"));
//!
//! // The server refused: undo.
//! state.apply(Action::ToggleRollback { point });
//! assert!(!state.is_favorite("64b7f0c2a1d3e4f5a6b7c8d9"));
//! ```
//!
//! ## Persistence
//!
//! [`Outbox::snapshot`] and [`Outbox::from_snapshot`] convert to and from
//! [`OutboxSnapshot`], which serializes to JSON.

pub mod cache;
pub mod error;
pub mod outbox;
pub mod property;
pub mod reconcile;
pub mod snapshot;
pub mod state;

// Re-export main types at crate root
pub use cache::PropertyCache;
pub use error::{Error, INVALID_ID_MESSAGE, PROPERTY_NOT_FOUND_MESSAGE};
pub use outbox::{Outbox, OutboxEntry, OutboxStatus};
pub use property::{
    is_canonical_id, normalize_id, CurrentUser, ModerationStatus, Property, ServerFavorite,
    ToggleResponse, CANONICAL_ID_LEN, RESERVED_FIELDS,
};
pub use reconcile::{
    ids_to_sync, merge_favorites, resolve_server_favorites, SyncDisposition, SyncReport,
};
pub use snapshot::{OutboxSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use state::{reduce, Action, FavoritesState, RollbackPoint};

/// Identifier of a property listing.
pub type PropertyId = String;
