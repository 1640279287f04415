//! Asynchronous report workflows: create a job, poll it to a terminal
//! state with adaptive backoff, download and decode the payload.
//!
//! "Report not ready" and "report failed" are expected transient outcomes,
//! so the pipeline returns absence values instead of raising: `create`
//! yields `None` for unsupported configurations, `poll` yields `None` on
//! failure or timeout, and `download` yields an empty row set when every
//! attempt fails. Callers decide whether to skip the analytics cycle.

mod decode;
pub mod definitions;

pub use decode::{decode_rows, DecodeError, ReportRow};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate, Utc};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::http::Requester;

/// Default worker pool size for parallel report runs
pub const DEFAULT_MAX_WORKERS: usize = 3;

const DOWNLOAD_RETRIES: usize = 3;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// First poll interval, grows by 1.5x per round
    pub initial_interval: Duration,
    /// Upper bound for the poll interval
    pub max_interval: Duration,
    /// Overall deadline for a single polled report
    pub timeout: Duration,
    /// More generous deadline used by parallel runs
    pub parallel_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(300),
            parallel_timeout: Duration::from_secs(400),
        }
    }
}

/// One report to create and fetch
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub name: String,
    pub report_type: String,
    pub metrics: Vec<String>,
    /// `YYYY-MM-DD` or `YYYYMMDD`; defaults to yesterday (UTC)
    pub date: Option<String>,
    pub segment: Option<String>,
}

/// Status fields of a report job, normalized across API versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStatus {
    pub status: Option<String>,
    pub location: Option<String>,
}

impl ReportStatus {
    fn is_success(&self) -> bool {
        matches!(
            self.status.as_deref(),
            Some("SUCCESS") | Some("COMPLETED") | Some("DONE")
        )
    }

    fn is_failure(&self) -> bool {
        matches!(
            self.status.as_deref(),
            Some("FAILURE") | Some("FAILED") | Some("CANCELLED")
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReportPipeline {
    requester: Arc<Requester>,
    download_client: reqwest::Client,
    poll_config: PollConfig,
}

impl ReportPipeline {
    pub fn new(requester: Arc<Requester>) -> Self {
        Self {
            requester,
            download_client: reqwest::Client::new(),
            poll_config: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = poll_config;
        self
    }

    /// Create a report job. Returns the job id, or `None` when the
    /// configuration is unsupported, the date is malformed, or the
    /// creation request fails.
    pub async fn create(&self, request: &ReportRequest) -> Option<String> {
        let Some(definition) =
            definitions::lookup(&request.report_type, request.segment.as_deref())
        else {
            error!(
                "Unsupported report configuration: type={}, segment={:?}",
                request.report_type, request.segment
            );
            return None;
        };

        let start_date = resolve_report_date(request.date.as_deref())?;
        let end_date = start_date;

        let payload = json!({
            "name": format!("{}-report-{}", definition.report_type_id, start_date),
            "startDate": start_date.to_string(),
            "endDate": end_date.to_string(),
            "format": "GZIP_JSON",
            "timeUnit": "SUMMARY",
            "configuration": {
                "adProduct": "SPONSORED_PRODUCTS",
                "reportTypeId": definition.report_type_id,
                "columns": request.metrics,
                "metrics": request.metrics,
                "groupBy": definition.group_by,
            },
        });

        let response = match self.requester.post_json("/v2/reports", &payload).await {
            Ok(response) => response,
            Err(err) => {
                error!("Failed to create report '{}': {}", request.name, err);
                return None;
            }
        };

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(err) => {
                error!("Unreadable create-report response: {}", err);
                return None;
            }
        };

        let report_id = data
            .get("reportId")
            .or_else(|| data.get("report_id"))
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        match report_id {
            Some(id) => {
                info!("Created report {} ({})", id, definition.report_type_id);
                Some(id)
            }
            None => {
                error!("Unexpected create-report response: {}", data);
                None
            }
        }
    }

    /// Fetch and normalize the status of a report job. Transport errors
    /// are logged and produce an unknown status, which keeps the poll loop
    /// going until its deadline.
    pub async fn status(&self, report_id: &str) -> ReportStatus {
        let path = format!("/v2/reports/{report_id}");
        let response = match self.requester.get(&path, &[]).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Failed to get report status for {}: {}", report_id, err);
                return ReportStatus::default();
            }
        };

        match response.json::<Value>().await {
            Ok(data) => normalize_status(&data),
            Err(err) => {
                warn!("Unreadable report status for {}: {}", report_id, err);
                ReportStatus::default()
            }
        }
    }

    /// Poll a report until it reaches a terminal state or the timeout
    /// elapses. Returns the download location on success, `None` on
    /// failure or timeout.
    pub async fn poll(&self, report_id: &str, timeout: Duration) -> Option<String> {
        let started = Instant::now();
        let mut interval = self.poll_config.initial_interval;

        while started.elapsed() < timeout {
            let status = self.status(report_id).await;

            if status.is_success() {
                info!(
                    "Report {} ready in {:.1}s",
                    report_id,
                    started.elapsed().as_secs_f64()
                );
                if status.location.is_none() {
                    error!("Report {} succeeded without a download location", report_id);
                }
                return status.location;
            }
            if status.is_failure() {
                error!("Report {} failed: {:?}", report_id, status.status);
                return None;
            }

            debug!(
                "Report {} not ready ({:?}), next poll in {:?}",
                report_id, status.status, interval
            );
            tokio::time::sleep(interval).await;
            // Adaptive polling, gradually increase the wait
            interval = interval.mul_f64(1.5).min(self.poll_config.max_interval);
        }

        error!(
            "Report {} timed out after {:?}",
            report_id, timeout
        );
        None
    }

    /// Poll with the default single-report timeout.
    pub async fn wait_for_report(&self, report_id: &str) -> Option<String> {
        self.poll(report_id, self.poll_config.timeout).await
    }

    /// Download and decode a report payload. The signed download URL is
    /// fetched outside the rate limiter with a generous timeout; network
    /// and decode failures are retried with linear backoff, and an empty
    /// row set is returned when every attempt fails.
    pub async fn download(&self, url: &str) -> Vec<ReportRow> {
        let retry_delay = Duration::from_secs(2);

        for attempt in 0..DOWNLOAD_RETRIES {
            debug!(
                "Downloading report from {} (attempt {}/{})",
                url,
                attempt + 1,
                DOWNLOAD_RETRIES
            );

            let result = self
                .download_client
                .get(url)
                .timeout(DOWNLOAD_TIMEOUT)
                .send()
                .await;

            let failure: String = match result {
                Ok(response) if response.status().is_success() => {
                    match response.bytes().await {
                        Ok(content) => match decode_rows(&content) {
                            Ok(rows) => return rows,
                            Err(err) => format!("decode failed: {err}"),
                        },
                        Err(err) => format!("body read failed: {err}"),
                    }
                }
                Ok(response) => format!("download returned HTTP {}", response.status()),
                Err(err) => format!("download failed: {err}"),
            };

            if attempt + 1 == DOWNLOAD_RETRIES {
                error!(
                    "Giving up on report download after {} attempts: {}",
                    DOWNLOAD_RETRIES, failure
                );
                break;
            }
            warn!(
                "Report download attempt {}/{} failed: {}",
                attempt + 1,
                DOWNLOAD_RETRIES,
                failure
            );
            tokio::time::sleep(retry_delay * (attempt as u32 + 1)).await;
        }

        Vec::new()
    }

    /// Create several reports and fetch them concurrently.
    ///
    /// Creation calls stay sequential - they share the rate limiter and
    /// must not race each other for quota. Waiting and downloading fan out
    /// across a semaphore-bounded worker set; the result map contains
    /// exactly the reports whose poll succeeded.
    pub async fn run_parallel(
        &self,
        requests: &[ReportRequest],
        max_workers: usize,
    ) -> HashMap<String, Vec<ReportRow>> {
        let started = Instant::now();
        info!("Creating {} reports", requests.len());

        let mut jobs = Vec::new();
        for request in requests {
            if let Some(report_id) = self.create(request).await {
                info!("Created report '{}': {}", request.name, report_id);
                jobs.push((request.name.clone(), report_id));
            }
        }

        if jobs.is_empty() {
            error!("No reports were created successfully");
            return HashMap::new();
        }

        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let mut workers: JoinSet<Option<(String, Vec<ReportRow>)>> = JoinSet::new();

        for (name, report_id) in jobs {
            let pipeline = self.clone();
            let semaphore = semaphore.clone();
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let url = pipeline
                    .poll(&report_id, pipeline.poll_config.parallel_timeout)
                    .await?;
                info!("Report '{}' ready for download", name);
                let rows = pipeline.download(&url).await;
                Some((name, rows))
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Some((name, rows))) => {
                    info!("Downloaded report '{}': {} records", name, rows.len());
                    results.insert(name, rows);
                }
                Ok(None) => {}
                Err(err) => error!("Report worker failed: {}", err),
            }
        }

        info!(
            "Parallel report processing complete in {:.1}s",
            started.elapsed().as_secs_f64()
        );
        results
    }
}

/// Default to yesterday (UTC) when no date is given; accept `YYYYMMDD`
/// and `YYYY-MM-DD` otherwise.
fn resolve_report_date(date: Option<&str>) -> Option<NaiveDate> {
    match date {
        None => Utc::now().date_naive().checked_sub_days(Days::new(1)),
        Some(raw) => {
            let parsed = if raw.len() == 8 {
                NaiveDate::parse_from_str(raw, "%Y%m%d")
            } else {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            };
            match parsed {
                Ok(date) => Some(date),
                Err(err) => {
                    error!("Invalid report date '{}': {}", raw, err);
                    None
                }
            }
        }
    }
}

/// The reporting API has drifted across versions in how it names the
/// status and download-location fields; fold the known spellings into one
/// shape.
fn normalize_status(data: &Value) -> ReportStatus {
    let status = data
        .get("status")
        .or_else(|| data.get("processingStatus"))
        .or_else(|| data.get("state"))
        .and_then(Value::as_str)
        .map(|s| s.to_uppercase());

    let location = data
        .get("location")
        .and_then(Value::as_str)
        .or_else(|| data.get("url").and_then(Value::as_str))
        .or_else(|| {
            data.get("report")
                .and_then(|r| r.get("url").or_else(|| r.get("downloadUrl")))
                .and_then(Value::as_str)
        })
        .or_else(|| {
            data.get("file")
                .and_then(|f| f.get("url"))
                .and_then(Value::as_str)
        })
        .map(|s| s.to_string());

    ReportStatus { status, location }
}
