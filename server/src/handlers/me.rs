//! Current user handler.

use barryland_engine::{CurrentUser, ServerFavorite};
use sqlx::PgPool;

use crate::auth::AuthUser;
use crate::db;
use crate::error::Result;

/// The authenticated user with populated favorites.
pub async fn handle_me(pool: &PgPool, user: AuthUser) -> Result<CurrentUser> {
    let favorites = db::get_favorite_properties(pool, &user.id)
        .await?
        .iter()
        .map(|stored| ServerFavorite::Property(stored.to_property(true)))
        .collect();

    Ok(CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        favorites,
    })
}
