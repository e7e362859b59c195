//! Toggle handler - flips a favorite for the authenticated user.

use barryland_engine::ToggleResponse;
use sqlx::PgPool;

use crate::auth::AuthUser;
use crate::db;
use crate::error::{AppError, Result};
use crate::handlers::parse_property_id;

/// Toggle a favorite and report the new state with the canonical record.
pub async fn handle_toggle(pool: &PgPool, user: &AuthUser, id: &str) -> Result<ToggleResponse> {
    let id = parse_property_id(id)?;

    let toggled = db::toggle_favorite(pool, &user.id, &id)
        .await?
        .ok_or(AppError::PropertyNotFound)?;

    tracing::debug!(
        user_id = %user.id,
        property_id = %id,
        is_favorite = toggled.is_favorite,
        "Favorite toggled"
    );

    let property = toggled.property.to_property(toggled.is_favorite);
    Ok(ToggleResponse {
        is_favorite: toggled.is_favorite,
        favorites_count: Some(property.favorites),
        property: Some(property),
    })
}
