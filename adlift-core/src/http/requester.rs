//! The single funnel for outbound API traffic.
//!
//! Every logical call acquires a rate-limit token, attaches the bearer and
//! scope headers, and survives the remote API's usual failure modes: 429
//! with `Retry-After`, 401/403 requiring one re-authentication, and the
//! 5xx/network noise that a linear backoff absorbs.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::endpoints;
use super::error::{HttpError, BODY_SNIPPET_LIMIT};
use crate::auth::{AuthError, Authenticator};
use crate::rate_limit::TokenBucket;

const USER_AGENT_VALUE: &str = "adlift/0.3";

const CLIENT_ID_HEADER: &str = "Amazon-Advertising-API-ClientId";
const SCOPE_HEADER: &str = "Amazon-Advertising-API-Scope";
const VERSION_HEADER: &str = "Amazon-Advertising-API-Version";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("exhausted all {attempts} attempts calling {path}: {error}")]
    ExhaustedAttempts {
        error: HttpError,
        attempts: usize,
        path: String,
    },
    #[error(transparent)]
    Http(HttpError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RequestError {
    /// Get the underlying HTTP error, if any
    pub fn http_error(&self) -> Option<&HttpError> {
        match self {
            Self::ExhaustedAttempts { error, .. } => Some(error),
            Self::Http(error) => Some(error),
            _ => None,
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        self.http_error().and_then(|e| e.status_code())
    }

    /// Check if this is an authentication/authorization failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
            || self.http_error().map(|e| e.is_auth_error()).unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempt budget per logical request, first try included
    pub max_attempts: usize,
    /// Base delay, scaled linearly with the attempt number
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Issues one logical API call with rate limiting, auth headers and the
/// retry policy. Cheap to share: report workers and the main flow hold the
/// same instance behind an `Arc`.
#[derive(Debug)]
pub struct Requester {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<Authenticator>,
    limiter: TokenBucket,
    retry: RetryConfig,
    timeout: Duration,
}

impl Requester {
    pub fn new(base_url: impl Into<String>, auth: Arc<Authenticator>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            limiter: TokenBucket::default(),
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_limiter(mut self, limiter: TokenBucket) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, RequestError> {
        self.execute(Method::GET, path, Some(query), None).await
    }

    pub async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, RequestError> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, None, Some(body)).await
    }

    pub async fn put_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, RequestError> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, path, None, Some(body)).await
    }

    pub async fn send_json<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<Response, RequestError> {
        let body = serde_json::to_value(body)?;
        self.execute(method, path, None, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<Value>,
    ) -> Result<Response, RequestError> {
        let resolved = endpoints::resolve(path);
        let url = format!("{}{}", self.base_url, resolved.path);

        let mut reauth_attempted = false;
        let mut last_error: Option<HttpError> = None;

        for attempt in 0..self.retry.max_attempts {
            self.limiter.acquire().await;

            let headers = self.headers(resolved.api_version).await?;
            debug!(
                "{} {} (attempt {}/{}) headers: {:?}",
                method,
                url,
                attempt + 1,
                self.retry.max_attempts,
                crate::utils::sensitive_data::redacted_headers(&headers),
            );

            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(headers)
                .timeout(self.timeout);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    let err = HttpError::from(err);
                    warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.retry.max_attempts,
                        err
                    );
                    last_error = Some(err);
                    self.backoff(attempt).await;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after(response.headers())
                    .unwrap_or(self.retry.base_delay * ((attempt as u32 + 1) * 2));
                warn!("Rate limit hit on {} {}, waiting {:?}", method, url, delay);
                last_error = Some(HttpError::http(429, body_snippet(response).await));
                if attempt + 1 < self.retry.max_attempts {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            let snippet = body_snippet(response).await;
            error!("Amazon API error {} on {} {}: {}", status, method, url, snippet);

            if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN)
                && !reauth_attempted
            {
                info!(
                    "Received {} from the API, refreshing credentials and retrying",
                    status
                );
                self.auth.force_refresh().await?;
                reauth_attempted = true;
                last_error = Some(HttpError::from_status(status, snippet));
                self.backoff(attempt).await;
                continue;
            }

            if status.is_server_error()
                || status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
            {
                last_error = Some(HttpError::from_status(status, snippet));
                self.backoff(attempt).await;
                continue;
            }

            // Remaining client errors are not retriable - fail fast
            return Err(RequestError::Http(HttpError::from_status(status, snippet)));
        }

        Err(RequestError::ExhaustedAttempts {
            error: last_error.unwrap_or(HttpError::Timeout),
            attempts: self.retry.max_attempts,
            path: resolved.path,
        })
    }

    async fn headers(&self, api_version: Option<&'static str>) -> Result<HeaderMap, AuthError> {
        let token = self.auth.bearer_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {token}"), "access token")?,
        );
        headers.insert(
            CLIENT_ID_HEADER,
            header_value(self.auth.client_id(), "client id")?,
        );
        headers.insert(
            SCOPE_HEADER,
            header_value(self.auth.profile_id(), "profile id")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(api_version) = api_version {
            headers.insert(VERSION_HEADER, HeaderValue::from_static(api_version));
        }

        Ok(headers)
    }

    async fn backoff(&self, attempt: usize) {
        // No point sleeping once the attempt budget is spent
        if attempt + 1 >= self.retry.max_attempts {
            return;
        }
        let delay = self.retry.base_delay * (attempt as u32 + 1);
        tokio::time::sleep(delay).await;
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value)
        .map_err(|_| AuthError::InvalidResponse(format!("{what} is not a valid header value")))
}

/// Parse a `Retry-After` header given in seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

async fn body_snippet(response: Response) -> String {
    match response.text().await {
        Ok(body) if body.is_empty() => "Empty response".to_string(),
        Ok(body) => body.chars().take(BODY_SNIPPET_LIMIT).collect(),
        Err(_) => "Unreadable response body".to_string(),
    }
}
