//! OAuth2 token exchange against the Login-with-Amazon token endpoint.
//!
//! The API only accepts short-lived bearer tokens; the long-lived refresh
//! token from the credential bundle is exchanged here. Tokens are renewed
//! proactively 60 seconds before expiry to absorb clock skew and in-flight
//! latency, and reactively (at most once per request) when the remote side
//! answers 401/403.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::credentials::Credentials;
use crate::utils::secret::MaskedSecret;

/// Login-with-Amazon OAuth2 token endpoint
pub const TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// Tokens count as expired this long before their actual expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const DEFAULT_EXPIRES_IN: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing required credentials: {0}")]
    MissingCredentials(String),
    #[error("token endpoint request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {snippet}")]
    Rejected { status: u16, snippet: String },
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// A bearer token with its absolute expiry time
#[derive(Debug, Clone)]
pub struct AuthToken {
    access_token: MaskedSecret,
    pub token_type: String,
    expires_at: Instant,
}

impl AuthToken {
    /// True once the token is within the expiry margin
    pub fn is_expired(&self) -> bool {
        match self.expires_at.checked_sub(EXPIRY_MARGIN) {
            Some(deadline) => Instant::now() > deadline,
            // Margin underflows the clock epoch, the deadline is long past
            None => true,
        }
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

/// Exchanges the refresh credential for bearer tokens and caches the
/// current one. Shared between the main flow and report workers, so the
/// token slot sits behind an async RwLock.
#[derive(Debug)]
pub struct Authenticator {
    client: reqwest::Client,
    token_url: String,
    credentials: Credentials,
    token: RwLock<Option<AuthToken>>,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_token_url(credentials, TOKEN_URL)
    }

    /// Use a non-default token endpoint (tests point this at a mock server)
    pub fn with_token_url(credentials: Credentials, token_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: token_url.into(),
            credentials,
            token: RwLock::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn profile_id(&self) -> &str {
        &self.credentials.profile_id
    }

    /// Perform one refresh-token grant against the token endpoint.
    pub async fn authenticate(&self) -> Result<AuthToken, AuthError> {
        if self.credentials.refresh_token.is_blank() || self.credentials.client_secret.is_blank()
        {
            return Err(AuthError::MissingCredentials(
                "client_secret, refresh_token".to_string(),
            ));
        }

        debug!(
            "POST {} (client_id: {})",
            self.token_url,
            crate::utils::sensitive_data::mask_sensitive_value(&self.credentials.client_id)
        );

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.expose_secret()),
            ("client_id", &self.credentials.client_id),
            ("client_secret", self.credentials.client_secret.expose_secret()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let snippet = response.text().await.unwrap_or_default();
            error!("Token endpoint error {}: {}", status, snippet);
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                snippet: snippet.chars().take(200).collect(),
            });
        }

        let data: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        // Strip whitespace from the token, a recurring quirk with tokens
        // that round-trip through secret managers
        let access_token = data.access_token.trim().to_string();
        if access_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "access_token field is empty".to_string(),
            ));
        }

        let expires_in = data.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        let token = AuthToken {
            access_token: MaskedSecret::new(access_token),
            token_type: data.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        };

        info!("Successfully authenticated with the Amazon Ads API");
        Ok(token)
    }

    /// Return the current bearer token, authenticating first when no token
    /// is cached or the cached one is within the expiry margin.
    pub async fn bearer_token(&self) -> Result<String, AuthError> {
        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref() {
                if !token.is_expired() {
                    return Ok(token.access_token().to_string());
                }
            }
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = slot.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token().to_string());
            }
            info!("Access token expired, refreshing");
        }

        let token = self.authenticate().await?;
        let access_token = token.access_token().to_string();
        *slot = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token and fetch a fresh one. Used by the request
    /// path when the remote side answers 401/403.
    pub async fn force_refresh(&self) -> Result<(), AuthError> {
        let mut slot = self.token.write().await;
        let token = self.authenticate().await?;
        *slot = Some(token);
        Ok(())
    }
}
