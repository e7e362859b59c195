//! Property cache - the in-memory listings favorites are resolved against.
//!
//! Holds two lists: the global listing and the current user's own
//! listings. A property may appear in both; updates are applied to every
//! copy so the two never disagree about favorite state.

use crate::{Property, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cached property lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCache {
    listing: Vec<Property>,
    own: Vec<Property>,
}

impl PropertyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache from both lists.
    pub fn with_lists(listing: Vec<Property>, own: Vec<Property>) -> Self {
        Self { listing, own }
    }

    /// The global listing.
    pub fn listing(&self) -> &[Property] {
        &self.listing
    }

    /// The current user's own listings.
    pub fn own(&self) -> &[Property] {
        &self.own
    }

    /// Replace both lists.
    pub fn replace_lists(&mut self, listing: Vec<Property>, own: Vec<Property>) {
        self.listing = listing;
        self.own = own;
    }

    /// Find a property by id, listing first.
    pub fn find(&self, id: &str) -> Option<&Property> {
        self.listing
            .iter()
            .chain(self.own.iter())
            .find(|p| p.id == id)
    }

    /// Check if any list contains the id.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Whether any cached copy of the property is flagged as favorite.
    pub fn is_flagged_favorite(&self, id: &str) -> bool {
        self.entries(id).any(|p| p.is_favorite)
    }

    /// Resolve an id to a display record, falling back to a placeholder.
    ///
    /// Resolved records are always flagged as favorite since they are
    /// only requested for the favorites list.
    pub fn resolve(&self, id: &str) -> Property {
        match self.find(id) {
            Some(property) => {
                let mut property = property.clone();
                property.is_favorite = true;
                property
            }
            None => Property::placeholder(id),
        }
    }

    /// Resolve many ids, skipping duplicates.
    pub fn resolve_all<'a, I>(&self, ids: I) -> Vec<Property>
    where
        I: IntoIterator<Item = &'a PropertyId>,
    {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for id in ids {
            if seen.insert(id.as_str()) {
                resolved.push(self.resolve(id));
            }
        }
        resolved
    }

    /// Apply an optimistic flag change to every cached copy.
    pub fn set_favorite(&mut self, id: &str, favorite: bool) {
        for property in self.entries_mut(id) {
            property.set_favorite(favorite);
        }
    }

    /// Merge server-reported counters into every cached copy, keeping the
    /// rest of each record.
    ///
    /// Without a reported count, a flag the server flips back also undoes
    /// the optimistic counter move.
    pub fn merge_counters(&mut self, id: &str, is_favorite: bool, favorites: Option<u64>) {
        for property in self.entries_mut(id) {
            match favorites {
                Some(count) => {
                    property.is_favorite = is_favorite;
                    property.favorites = count;
                }
                None => property.set_favorite(is_favorite),
            }
        }
    }

    /// Replace every cached copy with a canonical record.
    pub fn replace(&mut self, canonical: &Property) {
        for property in self.entries_mut(&canonical.id) {
            *property = canonical.clone();
        }
    }

    /// Restore the cached copies of a property from a saved point.
    ///
    /// `None` entries mean the property was absent from that list; the
    /// cache never removes or inserts records on restore.
    pub fn restore(&mut self, id: &str, listing: Option<&Property>, own: Option<&Property>) {
        if let Some(saved) = listing {
            if let Some(property) = self.listing.iter_mut().find(|p| p.id == id) {
                *property = saved.clone();
            }
        }
        if let Some(saved) = own {
            if let Some(property) = self.own.iter_mut().find(|p| p.id == id) {
                *property = saved.clone();
            }
        }
    }

    /// Re-derive every favorite flag from a set of favorite ids.
    pub fn mark_favorites(&mut self, favorites: &HashSet<&str>) {
        for property in self.listing.iter_mut().chain(self.own.iter_mut()) {
            property.is_favorite = favorites.contains(property.id.as_str());
        }
    }

    /// Clear every favorite flag.
    pub fn clear_favorites(&mut self) {
        for property in self.listing.iter_mut().chain(self.own.iter_mut()) {
            property.is_favorite = false;
        }
    }

    pub(crate) fn listing_entry(&self, id: &str) -> Option<&Property> {
        self.listing.iter().find(|p| p.id == id)
    }

    pub(crate) fn own_entry(&self, id: &str) -> Option<&Property> {
        self.own.iter().find(|p| p.id == id)
    }

    fn entries<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.listing
            .iter()
            .chain(self.own.iter())
            .filter(move |p| p.id == id)
    }

    fn entries_mut<'a>(&'a mut self, id: &'a str) -> impl Iterator<Item = &'a mut Property> + 'a {
        self.listing
            .iter_mut()
            .chain(self.own.iter_mut())
            .filter(move |p| p.id == id)
    }
}
