use std::sync::Arc;
use std::time::Duration;

use adlift_core::audit::AuditSink;
use adlift_core::auth::{Authenticator, TOKEN_URL};
use adlift_core::credentials::Credentials;
use adlift_core::gateway::AdsGateway;
use adlift_core::http::{Requester, RetryConfig};
use adlift_core::rate_limit::TokenBucket;
use adlift_core::reports::{PollConfig, ReportPipeline};
use adlift_core::settings::Settings;

/// AppContext wires the gateway components together for one CLI run
pub struct AppContext {
    pub settings: Settings,
    pub gateway: AdsGateway,
    pub reports: ReportPipeline,
    audit: Arc<AuditSink>,
}

impl AppContext {
    pub fn new(settings: Settings, credentials: Credentials) -> Self {
        let token_url = settings
            .token_url
            .clone()
            .unwrap_or_else(|| TOKEN_URL.to_string());
        let auth = Arc::new(Authenticator::with_token_url(credentials, token_url));

        let requester = Arc::new(
            Requester::new(settings.base_url(), auth)
                .with_limiter(TokenBucket::new(
                    settings.rate_limit.max_per_second,
                    settings.rate_limit.burst_size,
                ))
                .with_retry_config(RetryConfig {
                    max_attempts: settings.http.max_attempts,
                    base_delay: Duration::from_millis(settings.http.retry_base_delay_ms),
                })
                .with_timeout(Duration::from_secs(settings.http.request_timeout_secs)),
        );

        let audit = Arc::new(AuditSink::new(settings.audit.output_dir()));
        let gateway = AdsGateway::new(requester.clone(), audit.clone());
        let reports = ReportPipeline::new(requester).with_poll_config(PollConfig {
            initial_interval: Duration::from_secs(settings.reports.poll_initial_secs),
            max_interval: Duration::from_secs(settings.reports.poll_max_secs),
            timeout: Duration::from_secs(settings.reports.poll_timeout_secs),
            parallel_timeout: Duration::from_secs(settings.reports.parallel_poll_timeout_secs),
        });

        AppContext {
            settings,
            gateway,
            reports,
            audit,
        }
    }

    pub fn audit(&self) -> &Arc<AuditSink> {
        &self.audit
    }
}
