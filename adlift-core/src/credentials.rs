//! Credential bundle for the Amazon Ads API.
//!
//! The bundle arrives either as an opaque JSON object from the secret
//! bootstrap or from environment variables during local development. All
//! four fields are mandatory; a missing or blank field is a configuration
//! error at startup, never a runtime surprise halfway through a run.

use serde::Deserialize;

use crate::utils::secret::MaskedSecret;

/// Environment variable names used for local development
pub const ENV_CLIENT_ID: &str = "AMAZON_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AMAZON_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "AMAZON_REFRESH_TOKEN";
pub const ENV_PROFILE_ID: &str = "AMAZON_PROFILE_ID";

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("missing required credentials: {0}")]
    Missing(String),
    #[error("credential bundle is not valid JSON: {0}")]
    InvalidBundle(#[from] serde_json::Error),
}

/// Immutable credential set scoping every API call to one advertiser account.
///
/// Secret fields are wrapped in [`MaskedSecret`], so `{:?}` output shows a
/// partially masked value and full access requires `expose_secret()`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: MaskedSecret,
    pub refresh_token: MaskedSecret,
    pub profile_id: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        profile_id: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let credentials = Self {
            // Incidental whitespace sneaks in when values round-trip through
            // secret managers, strip it up front
            client_id: client_id.into().trim().to_string(),
            client_secret: MaskedSecret::new(client_secret.into().trim().to_string()),
            refresh_token: MaskedSecret::new(refresh_token.into().trim().to_string()),
            profile_id: profile_id.into().trim().to_string(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Parse the opaque JSON bundle handed over by the secret bootstrap.
    pub fn from_json_bundle(bundle: &str) -> Result<Self, CredentialsError> {
        let credentials: Credentials = serde_json::from_str(bundle)?;
        Self::new(
            credentials.client_id,
            credentials.client_secret.expose_secret(),
            credentials.refresh_token.expose_secret(),
            credentials.profile_id,
        )
    }

    /// Read credentials from the `AMAZON_*` environment variables.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self::new(
            var(ENV_CLIENT_ID),
            var(ENV_CLIENT_SECRET),
            var(ENV_REFRESH_TOKEN),
            var(ENV_PROFILE_ID),
        )
    }

    fn validate(&self) -> Result<(), CredentialsError> {
        let mut missing = Vec::new();
        if self.client_id.is_empty() {
            missing.push("client_id");
        }
        if self.client_secret.is_blank() {
            missing.push("client_secret");
        }
        if self.refresh_token.is_blank() {
            missing.push("refresh_token");
        }
        if self.profile_id.is_empty() {
            missing.push("profile_id");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CredentialsError::Missing(missing.join(", ")))
        }
    }
}
