//! Error types for the BarryLand engine.
//!
//! The same taxonomy is used on both sides of the favorites API: the server
//! maps its failures onto these status codes and the client maps responses
//! back with [`Error::from_status`].

use crate::PropertyId;
use thiserror::Error;

/// Message the API sends with a 404 for an unknown property.
pub const PROPERTY_NOT_FOUND_MESSAGE: &str = "Propriété non trouvée";

/// Message the API sends with a 400 for a malformed property id.
pub const INVALID_ID_MESSAGE: &str = "Identifiant de propriété invalide";

/// All possible errors from the favorites core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Remote errors
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid property id: {0}")]
    InvalidId(PropertyId),

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Decode(String),

    // Local errors
    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl Error {
    /// Map an HTTP status and response message to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Error::Unauthorized,
            400 => Error::InvalidId(message),
            404 => Error::NotFound { message },
            _ => Error::Server { status, message },
        }
    }

    /// True for the 404 the API returns when the property itself is unknown.
    ///
    /// A generic 404 (wrong route, missing user) does not match.
    pub fn is_property_not_found(&self) -> bool {
        match self {
            Error::NotFound { message } => {
                let message = message.to_lowercase();
                message.contains(&PROPERTY_NOT_FOUND_MESSAGE.to_lowercase())
                    || message.contains("property not found")
            }
            _ => false,
        }
    }

    /// Failures worth retrying later: the request may succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) | Error::Unauthorized => true,
            Error::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// The HTTP status this error corresponds to, if it came from the API.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized => Some(401),
            Error::InvalidId(_) => Some(400),
            Error::NotFound { .. } => Some(404),
            Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
