//! Translation of deprecated path-versioned endpoints to the current
//! header-versioned form.
//!
//! The Amazon Ads API is migrating away from `/v2/...` paths towards
//! unversioned paths plus an `Amazon-Advertising-API-Version` header, and
//! the reporting API already runs one version ahead of the Sponsored
//! Products endpoints. Callers keep addressing the legacy paths; this
//! module owns the mapping so nobody else needs to know which paths have
//! migrated.

use tracing::warn;

/// Version header value for Sponsored Products endpoints
pub const SP_API_VERSION: &str = "v2";

/// Version header value for the reporting API
pub const REPORTS_API_VERSION: &str = "v3";

/// A legacy path translated to its current form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub path: String,
    pub api_version: Option<&'static str>,
}

/// Legacy prefix -> (current prefix, version header). Longer prefixes first
/// so `/v2/sp/keywords/extended` is not swallowed by `/v2/sp/keywords`.
const LEGACY_PREFIXES: [(&str, &str, &str); 7] = [
    ("/v2/sp/campaigns", "/sp/campaigns", SP_API_VERSION),
    ("/v2/sp/adGroups", "/sp/adGroups", SP_API_VERSION),
    (
        "/v2/sp/keywords/extended",
        "/sp/keywords/extended",
        SP_API_VERSION,
    ),
    ("/v2/sp/keywords", "/sp/keywords", SP_API_VERSION),
    ("/v2/sp/negativeKeywords", "/sp/negativeKeywords", SP_API_VERSION),
    (
        "/v2/sp/targets/keywords/recommendations",
        "/sp/targets/keywords/recommendations",
        SP_API_VERSION,
    ),
    ("/v2/reports", "/reports", REPORTS_API_VERSION),
];

/// Translate a legacy `/v2/...` path to its current path and version header.
///
/// Paths already in current form pass through unchanged with no version
/// header. Unknown legacy paths under the `sp` namespace are stripped of
/// their `/v2` prefix with a warning rather than rejected, so remote path
/// drift degrades to a diagnosable request instead of a hard failure.
pub fn resolve(endpoint: &str) -> ResolvedEndpoint {
    if !endpoint.starts_with("/v2/") {
        return ResolvedEndpoint {
            path: endpoint.to_string(),
            api_version: None,
        };
    }

    for (old_prefix, new_prefix, api_version) in LEGACY_PREFIXES {
        if let Some(suffix) = endpoint.strip_prefix(old_prefix) {
            // Example: /v2/sp/campaigns/extended -> /sp/campaigns/extended
            return ResolvedEndpoint {
                path: format!("{new_prefix}{suffix}"),
                api_version: Some(api_version),
            };
        }
    }

    warn!("Unknown legacy endpoint format: {}", endpoint);
    let api_version = endpoint.starts_with("/v2/sp/").then_some(SP_API_VERSION);
    ResolvedEndpoint {
        path: endpoint["/v2".len()..].to_string(),
        api_version,
    }
}
