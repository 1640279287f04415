//! Secure secret handling using the secrecy crate with custom partial masking
//!
//! `MaskedSecret` protects credential values in memory (zeroized on drop),
//! shows partial masking in Debug/Display output (e.g. "****1234") and
//! requires explicit `.expose_secret()` calls for access.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use super::sensitive_data::mask_sensitive_value;

/// A secret string that provides memory protection via the secrecy crate
/// while showing partial masking in Debug output for usability.
///
/// # Example
/// ```
/// use adlift_core::utils::secret::MaskedSecret;
///
/// let refresh_token = MaskedSecret::new("Atzr|IwEB-example-refresh".to_string());
///
/// // Debug shows masked value (preserves dashes)
/// assert_eq!(format!("{:?}", refresh_token), "\"*********-*******-***resh\"");
///
/// // Explicit access required
/// assert_eq!(refresh_token.expose_secret(), "Atzr|IwEB-example-refresh");
/// ```
#[derive(Clone)]
pub struct MaskedSecret(SecretString);

impl MaskedSecret {
    /// Create a new masked secret from a String
    pub fn new(value: String) -> Self {
        Self(SecretString::new(value.into_boxed_str()))
    }

    /// Expose the secret value - this should only be called where absolutely
    /// necessary (e.g. building the token exchange request)
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the underlying value is empty after trimming whitespace
    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for MaskedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = mask_sensitive_value(self.0.expose_secret());
        write!(f, "\"{}\"", masked)
    }
}

impl std::fmt::Display for MaskedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = mask_sensitive_value(self.0.expose_secret());
        write!(f, "{}", masked)
    }
}

impl<'de> Deserialize<'de> for MaskedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(MaskedSecret::new(value))
    }
}

impl PartialEq for MaskedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for MaskedSecret {}
