//! Property records and the wire types of the favorites API.

use crate::PropertyId;
use serde::{Deserialize, Serialize};

/// Length of a server-issued identifier.
pub const CANONICAL_ID_LEN: usize = 24;

/// Check whether an id has the shape of a server-issued identifier
/// (24 hexadecimal characters).
///
/// Anything else is a client-only placeholder the server cannot know about.
pub fn is_canonical_id(id: &str) -> bool {
    id.len() == CANONICAL_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalize an identifier the way it is stored locally.
///
/// Canonical ids are lowercased since the server stores them that way.
/// Returns `None` for ids that are empty after trimming.
pub fn normalize_id(id: &str) -> Option<PropertyId> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        None
    } else if is_canonical_id(trimmed) {
        Some(trimmed.to_ascii_lowercase())
    } else {
        Some(trimmed.to_string())
    }
}

/// Moderation state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    /// Submitted, waiting for an admin
    #[default]
    Pending,
    /// Approved and publicly listed
    Validated,
    /// Refused by an admin
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Validated => "validated",
            ModerationStatus::Rejected => "rejected",
        }
    }

    /// Parse the stored form. Unknown values are treated as pending.
    pub fn parse(value: &str) -> Self {
        match value {
            "validated" => ModerationStatus::Validated,
            "rejected" => ModerationStatus::Rejected,
            _ => ModerationStatus::Pending,
        }
    }
}

/// A property listing as seen by the favorites logic.
///
/// Fields the favorites logic does not interpret are kept in `details`
/// so a full record from the server survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Identifier (`_id` on records coming from the document store)
    #[serde(alias = "_id")]
    pub id: PropertyId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ModerationStatus,
    /// Whether the current user has favorited this property
    #[serde(default)]
    pub is_favorite: bool,
    /// Number of users who favorited this property
    #[serde(default)]
    pub favorites: u64,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Wire keys owned by [`Property`] itself. They never appear in `details`.
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "_id",
    "title",
    "price",
    "location",
    "status",
    "isFavorite",
    "favorites",
];

impl Property {
    /// Create a property with just an id and a title.
    pub fn new(id: impl Into<PropertyId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: None,
            location: None,
            status: ModerationStatus::default(),
            is_favorite: false,
            favorites: 0,
            details: serde_json::Map::new(),
        }
    }

    /// Set the extra fields, dropping keys the record already carries.
    pub fn with_details(mut self, details: serde_json::Map<String, serde_json::Value>) -> Self {
        self.details = details
            .into_iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .collect();
        self
    }

    /// Minimal record for a favorite whose full property is not cached.
    pub fn placeholder(id: impl Into<PropertyId>) -> Self {
        let mut property = Self::new(id, "");
        property.is_favorite = true;
        property
    }

    /// Whether this record is a placeholder rather than a real listing.
    pub fn is_placeholder(&self) -> bool {
        self.title.is_empty() && self.price.is_none() && self.details.is_empty()
    }

    /// Apply a favorite flag change, moving the counter by one.
    ///
    /// The counter never goes below zero and is left alone when the flag
    /// does not actually change.
    pub fn set_favorite(&mut self, favorite: bool) {
        if self.is_favorite == favorite {
            return;
        }
        self.is_favorite = favorite;
        if favorite {
            self.favorites = self.favorites.saturating_add(1);
        } else {
            self.favorites = self.favorites.saturating_sub(1);
        }
    }
}

/// One entry of the server's favorites list.
///
/// The API returns either populated property objects or bare ids,
/// depending on whether the relation was populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFavorite {
    Id(PropertyId),
    Property(Property),
}

impl ServerFavorite {
    /// The identifier of the favorited property.
    pub fn id(&self) -> &str {
        match self {
            ServerFavorite::Id(id) => id,
            ServerFavorite::Property(property) => &property.id,
        }
    }
}

impl From<Property> for ServerFavorite {
    fn from(property: Property) -> Self {
        ServerFavorite::Property(property)
    }
}

/// Response of the toggle endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    /// Favorite state after the toggle
    pub is_favorite: bool,
    /// Updated counter, when the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites_count: Option<u64>,
    /// Full canonical record, when the server includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<Property>,
}

/// Response of the current-user endpoint, reduced to what favorites need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub favorites: Vec<ServerFavorite>,
}
