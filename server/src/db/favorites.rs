//! Favorite toggling.

use sqlx::PgPool;

use super::properties::{StoredProperty, PROPERTY_COLUMNS};

/// Result of a toggle.
#[derive(Debug)]
pub struct ToggledFavorite {
    /// Whether the property is a favorite after the toggle
    pub is_favorite: bool,
    /// The property with its updated counter
    pub property: StoredProperty,
}

/// Toggle a favorite for a user.
///
/// Runs in one transaction with the property row locked, so concurrent
/// toggles on the same property keep `favorites_count` equal to the number
/// of favorite rows. Returns `None` when the property does not exist.
pub async fn toggle_favorite(
    pool: &PgPool,
    user_id: &str,
    property_id: &str,
) -> Result<Option<ToggledFavorite>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists: Option<(String,)> =
        sqlx::query_as("SELECT id FROM properties WHERE id = $1 FOR UPDATE")
            .bind(property_id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    let removed = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND property_id = $2")
        .bind(user_id)
        .bind(property_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    let delta: i64 = if removed {
        -1
    } else {
        sqlx::query("INSERT INTO user_favorites (user_id, property_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(property_id)
            .execute(&mut *tx)
            .await?;
        1
    };

    let property = sqlx::query_as::<_, StoredProperty>(&format!(
        r#"
        UPDATE properties
        SET favorites_count = GREATEST(favorites_count + $2, 0)
        WHERE id = $1
        RETURNING {}
        "#,
        PROPERTY_COLUMNS
    ))
    .bind(property_id)
    .bind(delta)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(ToggledFavorite {
        is_favorite: !removed,
        property,
    }))
}
