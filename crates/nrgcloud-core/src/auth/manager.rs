//! Session token lifecycle for the NRG Cloud API.
//!
//! `SessionTokenManager` turns a client id and secret into a bearer token,
//! reusing the token cached on disk by earlier runs until it ages out.
//! The API limits how many tokens a client may create per day, so a cached
//! token is always preferred over a fresh request.
//!
//! Failures never propagate out of the lifecycle operations: a missing
//! credential, an unreadable cache, or a refused token request all leave
//! the manager in `TokenState::NoToken` and are reported as log events.
//! Callers check `session_token()` before using it.

use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Endpoints};
use crate::config::CloudConfig;

use super::{CacheError, Credentials, SessionToken, TokenCache, TokenState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "apiToken")]
    api_token: String,
}

/// What `maintain_token` did to reach its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRefresh {
    /// A valid cached token was reused; no request was made.
    Reused,
    /// A token request was issued; `obtained` is false when it failed.
    Requested { obtained: bool },
}

pub struct SessionTokenManager {
    client: Client,
    endpoints: Endpoints,
    cache: TokenCache,
    token_lifetime: Duration,
    credentials: Credentials,
    state: TokenState,
}

impl SessionTokenManager {
    /// Build a manager without touching the cache or the network.
    pub fn new(config: &CloudConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        debug!(
            base = %config.base_url,
            cache = %config.token_cache_path.display(),
            "Cloud API configured"
        );

        Ok(Self {
            client,
            endpoints: Endpoints::new(&config.base_url),
            cache: TokenCache::new(config.token_cache_path.clone()),
            token_lifetime: config.token_lifetime,
            credentials,
            state: TokenState::NoToken,
        })
    }

    /// Build a manager and bring it to a usable token when credentials allow.
    ///
    /// Empty credentials are reported and leave the manager without a token.
    /// Only a failure to build the HTTP client is returned as an error.
    pub async fn connect(
        config: &CloudConfig,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let mut manager = Self::new(config, credentials)?;
        if manager.credentials.is_complete() {
            manager.maintain_token().await;
        } else {
            error!(error = %ApiError::CredentialMissing, "Access error");
        }
        Ok(manager)
    }

    /// Reuse the cached token if it is still valid, otherwise request a new
    /// one and overwrite the cache.
    pub async fn maintain_token(&mut self) -> TokenRefresh {
        match self.load_cached_token() {
            Ok(Some(token)) if token.is_valid(self.token_lifetime) => {
                debug!(
                    expires_at = ?token.expires_at(self.token_lifetime),
                    "Reusing cached session token"
                );
                self.state = TokenState::Issued(token);
                return TokenRefresh::Reused;
            }
            Ok(Some(token)) => {
                debug!(issued_at = %token.issued_at, "Cached session token expired");
            }
            Ok(None) => {
                debug!(path = %self.cache.path().display(), "No cached session token");
            }
            Err(e) => {
                warn!(error = %e, "Token cache unavailable, requesting a new token");
            }
        }

        self.request_new_token().await;
        if let Err(e) = self.save_token() {
            warn!(error = %e, "Failed to cache session token");
        }
        TokenRefresh::Requested {
            obtained: self.state.token().is_some(),
        }
    }

    /// Issue one token request. A refusal or transport failure leaves
    /// `TokenState::NoToken`; nothing is retried.
    pub async fn request_new_token(&mut self) -> &TokenState {
        info!(url = %self.endpoints.token(), "Requesting session token");

        // Taken before sending so request latency counts against the window
        let issued_at = Utc::now();

        self.state = match self.fetch_token().await {
            Ok(token) => {
                info!("New session token OK");
                TokenState::Issued(SessionToken::new(token, issued_at))
            }
            Err(e) => {
                error!(error = %e, "Unable to get session token");
                TokenState::NoToken
            }
        };
        &self.state
    }

    async fn fetch_token(&self) -> Result<String, ApiError> {
        let body = TokenRequest {
            client_id: self.credentials.client_id(),
            client_secret: self.credentials.client_secret(),
        };

        let response = self
            .client
            .post(self.endpoints.token())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::token_request_failed(status, &body));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse token response: {}", e))
            })?;
        Ok(parsed.api_token)
    }

    /// Held token exists and is inside its validity window
    pub fn is_token_valid(&self) -> bool {
        self.state.is_valid_at(Utc::now(), self.token_lifetime)
    }

    /// Persist the held token. Nothing is written while no token is held.
    pub fn save_token(&self) -> Result<(), CacheError> {
        match self.state {
            TokenState::Issued(ref token) => {
                self.cache.save(token)?;
                debug!(path = %self.cache.path().display(), "Session token cached");
                Ok(())
            }
            TokenState::NoToken => {
                debug!("No session token to cache");
                Ok(())
            }
        }
    }

    /// Read the cache without changing the held token.
    pub fn load_cached_token(&self) -> Result<Option<SessionToken>, CacheError> {
        self.cache.load()
    }

    /// Refresh on demand and return the usable token, if any.
    pub async fn ensure_valid_token(&mut self) -> Option<&str> {
        if !self.is_token_valid() {
            if self.credentials.is_complete() {
                self.maintain_token().await;
            } else {
                error!(error = %ApiError::CredentialMissing, "Access error");
            }
        }
        self.session_token()
    }

    /// The bearer token, only while it is valid
    pub fn session_token(&self) -> Option<&str> {
        if self.is_token_valid() {
            self.state.token().map(|t| t.token.as_str())
        } else {
            None
        }
    }

    pub fn token_state(&self) -> &TokenState {
        &self.state
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.token().and_then(|t| t.expires_at(self.token_lifetime))
    }

    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.state.token().and_then(|t| t.time_until_expiry(self.token_lifetime))
    }

    /// Forget the held token and delete the cache file
    pub fn clear_cached_token(&mut self) -> Result<(), CacheError> {
        self.state = TokenState::NoToken;
        self.cache.clear()
    }

    pub fn bearer_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let token = self.session_token().ok_or(ApiError::NoToken)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        Ok(headers)
    }

    /// Attach the bearer token to a request built by an endpoint caller
    pub fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(request.headers(self.bearer_headers()?))
    }

    /// HTTP client shared with endpoint callers
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

// ============================================================================
// Tests
// ============================================================================
