//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use barryland_engine::{INVALID_ID_MESSAGE, PROPERTY_NOT_FOUND_MESSAGE};
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid property id")]
    InvalidId,

    #[error("Property not found")]
    PropertyNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status of the error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::PropertyNotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, details) = match self {
            AppError::Database(_) => ("Erreur serveur".to_string(), None),
            AppError::InvalidId => (INVALID_ID_MESSAGE.to_string(), None),
            AppError::PropertyNotFound => (PROPERTY_NOT_FOUND_MESSAGE.to_string(), None),
            AppError::Unauthorized(reason) => {
                ("Non autorisé".to_string(), Some(reason.to_string()))
            }
        };
        ErrorResponse { error, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            other => tracing::warn!("Request rejected: {}", other),
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use barryland_engine::Error;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::InvalidId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::PropertyNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unauthorized("Missing authorization header").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_body_is_recognized_by_clients() {
        let error = AppError::PropertyNotFound;
        let body = serde_json::to_value(error.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Propriété non trouvée" }));

        let mapped = Error::from_status(error.status().as_u16(), body["error"].as_str().unwrap());
        assert!(mapped.is_property_not_found());
    }

    #[test]
    fn invalid_id_maps_to_client_error() {
        let error = AppError::InvalidId;
        let mapped = Error::from_status(error.status().as_u16(), error.body().error);
        assert!(matches!(mapped, Error::InvalidId(_)));
        assert!(!mapped.is_transient());
    }

    #[test]
    fn unauthorized_carries_reason() {
        let body = AppError::Unauthorized("Invalid or expired session").body();
        assert_eq!(body.error, "Non autorisé");
        assert_eq!(body.details.as_deref(), Some("Invalid or expired session"));
    }
}
