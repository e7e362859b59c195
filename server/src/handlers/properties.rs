//! Property read handlers.

use std::collections::HashSet;

use barryland_engine::{is_canonical_id, Property};
use sqlx::PgPool;

use crate::auth::AuthUser;
use crate::db;
use crate::error::{AppError, Result};

/// Validate a property id from a path and put it in stored form.
pub fn parse_property_id(id: &str) -> Result<String> {
    let id = id.trim();
    if !is_canonical_id(id) {
        return Err(AppError::InvalidId);
    }
    Ok(id.to_ascii_lowercase())
}

async fn viewer_favorites(pool: &PgPool, viewer: Option<&AuthUser>) -> Result<HashSet<String>> {
    match viewer {
        Some(user) => Ok(db::favorite_ids(pool, &user.id).await?),
        None => Ok(HashSet::new()),
    }
}

/// Publicly listed properties, flagged for the viewer when logged in.
pub async fn handle_list(pool: &PgPool, viewer: Option<&AuthUser>) -> Result<Vec<Property>> {
    let favorites = viewer_favorites(pool, viewer).await?;
    let properties = db::list_validated_properties(pool).await?;

    Ok(properties
        .iter()
        .map(|stored| stored.to_property(favorites.contains(&stored.id)))
        .collect())
}

/// One property by id.
pub async fn handle_get(pool: &PgPool, id: &str, viewer: Option<&AuthUser>) -> Result<Property> {
    let id = parse_property_id(id)?;

    let stored = db::get_property(pool, &id)
        .await?
        .ok_or(AppError::PropertyNotFound)?;
    let favorites = viewer_favorites(pool, viewer).await?;

    Ok(stored.to_property(favorites.contains(&stored.id)))
}
