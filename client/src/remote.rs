//! Remote favorite source - the server side of favorites.

use std::future::Future;
use std::time::Duration;

use barryland_engine::{error::Result, CurrentUser, Error, ServerFavorite, ToggleResponse};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ClientConfig;

/// Server endpoints the favorites logic depends on.
///
/// Implementations map HTTP failures with [`Error::from_status`]:
/// 401 for a bad session, 400 for a malformed id, 404 for an unknown
/// property.
pub trait FavoriteSource: Send + Sync {
    /// The authenticated user's favorites.
    fn current_favorites(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<ServerFavorite>>> + Send;

    /// Toggle a favorite and return the server's view of it.
    fn toggle_favorite(
        &self,
        token: &str,
        id: &str,
    ) -> impl Future<Output = Result<ToggleResponse>> + Send;
}

/// Error body of the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// [`FavoriteSource`] over the REST API.
#[derive(Debug, Clone)]
pub struct HttpFavoriteSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFavoriteSource {
    /// Create a source for the API at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a source from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.error.or(body.message))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        if status != StatusCode::UNAUTHORIZED {
            tracing::debug!(status = status.as_u16(), %message, "API request failed");
        }
        Err(Error::from_status(status.as_u16(), message))
    }
}

fn network_error(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

impl FavoriteSource for HttpFavoriteSource {
    async fn current_favorites(&self, token: &str) -> Result<Vec<ServerFavorite>> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network_error)?;

        let user: CurrentUser = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;

        Ok(user.favorites)
    }

    async fn toggle_favorite(&self, token: &str, id: &str) -> Result<ToggleResponse> {
        let response = self
            .client
            .post(self.url(&format!("/properties/{}/favorite", id)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network_error)?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))
    }
}
