//! Favorites state and its transitions.
//!
//! Every change to the cached properties or the favorites list is
//! expressed as an [`Action`] and applied by one transition function, so
//! concurrent call sites always build on the latest state instead of a
//! stale copy.

use crate::{
    reconcile::{id_set, merge_favorites},
    Property, PropertyCache, PropertyId, ToggleResponse,
};
use serde::{Deserialize, Serialize};

/// Saved view of one property, used to undo an optimistic toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackPoint {
    pub id: PropertyId,
    /// Copy from the global listing, if cached there
    pub listing: Option<Property>,
    /// Copy from the user's own listings, if cached there
    pub own: Option<Property>,
    /// Position and entry in the favorites list, if it was a favorite
    pub favorite: Option<(usize, Property)>,
}

/// A state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// New property lists arrived
    PropertiesLoaded {
        listing: Vec<Property>,
        own: Vec<Property>,
    },
    /// A toggle was requested and is applied before the server answers
    ToggleOptimistic { id: PropertyId, favorite: bool },
    /// The server answered a toggle
    ToggleSettled {
        id: PropertyId,
        response: ToggleResponse,
    },
    /// The server refused a toggle; restore the saved view
    ToggleRollback { point: RollbackPoint },
    /// Replace the favorites list with server favorites plus pending ids
    SyncMerge {
        server: Vec<Property>,
        pending: Vec<PropertyId>,
    },
    /// The session ended; nothing is a favorite anymore
    SessionCleared,
}

/// Cached properties and the current favorites list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesState {
    cache: PropertyCache,
    favorites: Vec<Property>,
}

impl FavoritesState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The property cache.
    pub fn cache(&self) -> &PropertyCache {
        &self.cache
    }

    /// The favorites list, in display order.
    pub fn favorites(&self) -> &[Property] {
        &self.favorites
    }

    /// Ids of the favorites list.
    pub fn favorite_ids(&self) -> Vec<PropertyId> {
        self.favorites.iter().map(|p| p.id.clone()).collect()
    }

    /// Whether the property is currently a favorite.
    ///
    /// Checks both the favorites list and the cached flags, which can drift
    /// apart while a toggle is in flight.
    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|p| p.id == id) || self.cache.is_flagged_favorite(id)
    }

    /// Capture what a rollback of a toggle on `id` needs.
    pub fn rollback_point(&self, id: &str) -> RollbackPoint {
        RollbackPoint {
            id: id.to_string(),
            listing: self.cache.listing_entry(id).cloned(),
            own: self.cache.own_entry(id).cloned(),
            favorite: self
                .favorites
                .iter()
                .position(|p| p.id == id)
                .map(|index| (index, self.favorites[index].clone())),
        }
    }

    /// Apply an action in place.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::PropertiesLoaded { listing, own } => {
                self.cache.replace_lists(listing, own);
                let ids = id_set(&self.favorites);
                self.cache.mark_favorites(&ids);
            }
            Action::ToggleOptimistic { id, favorite } => {
                self.cache.set_favorite(&id, favorite);
                if favorite {
                    let entry = self.cache.resolve(&id);
                    self.upsert_favorite(entry);
                } else {
                    self.remove_favorite(&id);
                }
            }
            Action::ToggleSettled { id, response } => self.settle(&id, response),
            Action::ToggleRollback { point } => {
                self.cache
                    .restore(&point.id, point.listing.as_ref(), point.own.as_ref());
                self.remove_favorite(&point.id);
                if let Some((index, entry)) = point.favorite {
                    let index = index.min(self.favorites.len());
                    self.favorites.insert(index, entry);
                }
            }
            Action::SyncMerge { server, pending } => {
                self.favorites = merge_favorites(server, &pending, &self.cache);
                let ids = id_set(&self.favorites);
                self.cache.mark_favorites(&ids);
            }
            Action::SessionCleared => {
                self.favorites.clear();
                self.cache.clear_favorites();
            }
        }
    }

    fn settle(&mut self, id: &str, response: ToggleResponse) {
        let is_favorite = response.is_favorite;
        match response.property {
            Some(mut canonical) => {
                canonical.is_favorite = is_favorite;
                self.cache.replace(&canonical);
                if is_favorite {
                    self.upsert_favorite(canonical);
                } else {
                    self.remove_favorite(id);
                }
            }
            None => {
                self.cache
                    .merge_counters(id, is_favorite, response.favorites_count);
                if is_favorite {
                    let mut entry = self
                        .favorites
                        .iter()
                        .find(|p| p.id == id)
                        .cloned()
                        .unwrap_or_else(|| self.cache.resolve(id));
                    entry.is_favorite = true;
                    if let Some(count) = response.favorites_count {
                        entry.favorites = count;
                    }
                    self.upsert_favorite(entry);
                } else {
                    self.remove_favorite(id);
                }
            }
        }
    }

    fn upsert_favorite(&mut self, mut entry: Property) {
        entry.is_favorite = true;
        match self.favorites.iter_mut().find(|p| p.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.favorites.push(entry),
        }
    }

    fn remove_favorite(&mut self, id: &str) {
        self.favorites.retain(|p| p.id != id);
    }
}

/// Pure transition: the state after applying `action`.
pub fn reduce(mut state: FavoritesState, action: Action) -> FavoritesState {
    state.apply(action);
    state
}
