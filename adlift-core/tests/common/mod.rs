#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use adlift_core::auth::Authenticator;
use adlift_core::credentials::Credentials;
use adlift_core::http::{Requester, RetryConfig};
use adlift_core::rate_limit::TokenBucket;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/auth/o2/token";

/// Mount a token endpoint answering every refresh grant with a fresh token.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "Atza|test-token",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// A requester pointed at the mock server, with an effectively unthrottled
/// rate limiter and short retry delays to keep tests fast.
pub fn test_requester(server: &MockServer) -> Arc<Requester> {
    let credentials =
        Credentials::new("client-id", "client-secret", "refresh-token", "12345").unwrap();
    let auth = Arc::new(Authenticator::with_token_url(
        credentials,
        format!("{}{}", server.uri(), TOKEN_PATH),
    ));

    Arc::new(
        Requester::new(server.uri(), auth)
            .with_limiter(TokenBucket::new(1000, 100))
            .with_retry_config(RetryConfig {
                max_attempts: 3,
                base_delay: Duration::from_millis(20),
            }),
    )
}

/// Count received requests matching a method and path.
pub async fn request_count(server: &MockServer, http_method: &str, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| {
            r.method.to_string().eq_ignore_ascii_case(http_method) && r.url.path() == request_path
        })
        .count()
}
