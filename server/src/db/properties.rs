//! Database operations for the properties table.

use std::collections::HashSet;

use barryland_engine::{ModerationStatus, Property};
use sqlx::{PgPool, Row};

/// Columns selected for a property row.
pub(crate) const PROPERTY_COLUMNS: &str =
    "id, title, price, location, status, favorites_count, details";

/// A stored property row from the database.
#[derive(Debug)]
pub struct StoredProperty {
    pub id: String,
    pub title: String,
    pub price: Option<i64>,
    pub location: Option<String>,
    pub status: String,
    pub favorites_count: i64,
    pub details: serde_json::Value,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredProperty {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredProperty {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            price: row.try_get("price")?,
            location: row.try_get("location")?,
            status: row.try_get("status")?,
            favorites_count: row.try_get("favorites_count")?,
            details: row.try_get("details")?,
        })
    }
}

impl StoredProperty {
    /// Convert database row to a property, flagged for the current viewer.
    pub fn to_property(&self, is_favorite: bool) -> Property {
        let details = match &self.details {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };

        let mut property = Property::new(&self.id, &self.title).with_details(details);
        property.price = self.price.map(|p| p.max(0) as u64);
        property.location = self.location.clone();
        property.status = ModerationStatus::parse(&self.status);
        property.is_favorite = is_favorite;
        property.favorites = self.favorites_count.max(0) as u64;
        property
    }
}

/// Get a property by ID.
pub async fn get_property(pool: &PgPool, id: &str) -> Result<Option<StoredProperty>, sqlx::Error> {
    sqlx::query_as::<_, StoredProperty>(&format!(
        "SELECT {} FROM properties WHERE id = $1",
        PROPERTY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Get the publicly listed properties, newest first.
pub async fn list_validated_properties(pool: &PgPool) -> Result<Vec<StoredProperty>, sqlx::Error> {
    sqlx::query_as::<_, StoredProperty>(&format!(
        "SELECT {} FROM properties WHERE status = $1 ORDER BY created_at DESC",
        PROPERTY_COLUMNS
    ))
    .bind(ModerationStatus::Validated.as_str())
    .fetch_all(pool)
    .await
}

/// Ids of every property a user has favorited.
pub async fn favorite_ids(pool: &PgPool, user_id: &str) -> Result<HashSet<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT property_id FROM user_favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
