//! Session routes.

use axum::{extract::State, routing::get, Json, Router};
use barryland_engine::CurrentUser;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::handle_me;
use crate::AppState;

/// Create session routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me_handler))
}

/// GET /auth/me - Current user with populated favorites.
async fn me_handler(State(state): State<AppState>, user: AuthUser) -> Result<Json<CurrentUser>> {
    let me = handle_me(&state.pool, user).await?;
    Ok(Json(me))
}
