//! Property and favorite routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use barryland_engine::{Property, ToggleResponse};

use crate::auth::{AuthUser, OptionalAuthUser};
use crate::error::Result;
use crate::handlers::{handle_get, handle_list, handle_toggle};
use crate::AppState;

/// Create property routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/properties", get(list_handler))
        .route("/properties/{id}", get(get_handler))
        .route("/properties/{id}/favorite", post(toggle_handler))
}

/// GET /properties - Validated listings.
async fn list_handler(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
) -> Result<Json<Vec<Property>>> {
    let properties = handle_list(&state.pool, viewer.as_ref()).await?;
    Ok(Json(properties))
}

/// GET /properties/{id} - One property.
async fn get_handler(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<String>,
) -> Result<Json<Property>> {
    let property = handle_get(&state.pool, &id, viewer.as_ref()).await?;
    Ok(Json(property))
}

/// POST /properties/{id}/favorite - Toggle a favorite.
async fn toggle_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>> {
    let response = handle_toggle(&state.pool, &user, &id).await?;
    Ok(Json(response))
}
