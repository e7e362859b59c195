//! Database operations for users and their sessions.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};

use super::properties::{StoredProperty, PROPERTY_COLUMNS};

/// A stored user row from the database.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredUser {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredUser {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }
}

/// A session with its owner.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub user: StoredUser,
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredSession {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredSession {
            user: StoredUser::from_row(row)?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

/// Find the session for a bearer token.
pub async fn find_session(
    pool: &PgPool,
    token: &str,
) -> Result<Option<StoredSession>, sqlx::Error> {
    sqlx::query_as::<_, StoredSession>(
        r#"
        SELECT u.id, u.name, u.email, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

/// Get the properties a user has favorited, most recent first.
pub async fn get_favorite_properties(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<StoredProperty>, sqlx::Error> {
    let columns = PROPERTY_COLUMNS
        .split(", ")
        .map(|c| format!("p.{}", c))
        .collect::<Vec<_>>()
        .join(", ");

    sqlx::query_as::<_, StoredProperty>(&format!(
        r#"
        SELECT {}
        FROM user_favorites f
        JOIN properties p ON p.id = f.property_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        "#,
        columns
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
