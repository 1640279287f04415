//! Gateway configuration.
//!
//! Covers the gateway's own knobs only: API region, rate limit, retry
//! budget, timeouts, report polling and the audit output directory.
//! Business thresholds (target ACOS and friends) belong to the automation
//! layer on top and never appear here.
//!
//! Sources are layered the usual way: optional `config/default` and
//! `config/local` files, then `ADLIFT__`-prefixed environment variables
//! (e.g. `ADLIFT__RATE_LIMIT__MAX_PER_SECOND=5`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::rate_limit::{DEFAULT_BURST_SIZE, DEFAULT_MAX_PER_SECOND};

/// Regional API endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    #[default]
    Na,
    Eu,
    Fe,
}

impl Region {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Na => "https://advertising-api.amazon.com",
            Self::Eu => "https://advertising-api-eu.amazon.com",
            Self::Fe => "https://advertising-api-fe.amazon.com",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_per_second: DEFAULT_MAX_PER_SECOND,
            burst_size: DEFAULT_BURST_SIZE,
        }
    }
}

impl RateLimitSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_per_second == 0 {
            return Err(ConfigError::Message(
                "rate_limit.max_per_second must be greater than 0".into(),
            ));
        }
        if self.burst_size == 0 {
            return Err(ConfigError::Message(
                "rate_limit.burst_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub request_timeout_secs: u64,
    pub max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub poll_initial_secs: u64,
    pub poll_max_secs: u64,
    pub poll_timeout_secs: u64,
    pub parallel_poll_timeout_secs: u64,
    pub max_workers: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            poll_initial_secs: 2,
            poll_max_secs: 10,
            poll_timeout_secs: 300,
            parallel_poll_timeout_secs: 400,
            max_workers: crate::reports::DEFAULT_MAX_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub output_dir: Option<String>,
}

impl AuditSettings {
    pub fn output_dir(&self) -> &str {
        self.output_dir.as_deref().unwrap_or(".")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub region: Region,
    /// Overrides the regional endpoint, e.g. for the sandbox environment
    pub endpoint: Option<String>,
    pub rate_limit: RateLimitSettings,
    pub http: HttpSettings,
    pub reports: ReportSettings,
    pub audit: AuditSettings,
    /// Override for the OAuth token endpoint, used by tests
    pub token_url: Option<String>,
}

impl Settings {
    /// The API base URL, honoring the `endpoint` override
    pub fn base_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.region.base_url().to_string())
    }

    pub fn get_environment() -> Environment {
        Environment::default()
            .prefix("ADLIFT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::get_environment());

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()?;
        if self.http.max_attempts == 0 {
            return Err(ConfigError::Message(
                "http.max_attempts must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
