//! Report pipeline: create -> poll -> download workflows.

mod common;

use std::io::Write;
use std::time::Duration;

use adlift_core::reports::{PollConfig, ReportPipeline, ReportRequest};
use chrono::{Days, Utc};
use common::{mount_token_endpoint, test_requester};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CSV_TEXT: &str = "keywordId,clicks,cost\n111,10,1.50\n222,3,0.40\n";

fn gzip_payload() -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(CSV_TEXT.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn fast_poll_config() -> PollConfig {
    PollConfig {
        initial_interval: Duration::from_millis(20),
        max_interval: Duration::from_millis(50),
        timeout: Duration::from_secs(5),
        parallel_timeout: Duration::from_secs(5),
    }
}

fn test_pipeline(server: &MockServer) -> ReportPipeline {
    ReportPipeline::new(test_requester(server)).with_poll_config(fast_poll_config())
}

fn keyword_report(name: &str) -> ReportRequest {
    ReportRequest {
        name: name.to_string(),
        report_type: "keywords".to_string(),
        metrics: vec![
            "campaignId".to_string(),
            "keywordId".to_string(),
            "clicks".to_string(),
            "cost".to_string(),
        ],
        date: None,
        segment: None,
    }
}

#[tokio::test]
async fn test_create_defaults_to_yesterday() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/reports"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"reportId": "r-100"})),
        )
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    let report_id = pipeline.create(&keyword_report("perf")).await;
    assert_eq!(report_id.as_deref(), Some("r-100"));

    let requests = server.received_requests().await.unwrap();
    let create_request = requests
        .iter()
        .find(|r| r.url.path() == "/reports")
        .expect("a creation request must have been sent");
    let body: serde_json::Value = serde_json::from_slice(&create_request.body).unwrap();

    let yesterday = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap()
        .to_string();
    assert_eq!(body["startDate"], json!(yesterday));
    assert_eq!(body["endDate"], json!(yesterday));
    assert_eq!(body["configuration"]["reportTypeId"], json!("spKeywords"));
}

#[tokio::test]
async fn test_create_unsupported_combination_returns_none() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let pipeline = test_pipeline(&server);
    let mut request = keyword_report("bad");
    request.segment = Some("query".to_string());

    assert_eq!(pipeline.create(&request).await, None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_malformed_date_returns_none() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let pipeline = test_pipeline(&server);
    let mut request = keyword_report("bad-date");
    request.date = Some("13/01/2025".to_string());

    assert_eq!(pipeline.create(&request).await, None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_poll_returns_location_on_success() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/reports/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "PENDING"
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "location": "https://example.com/report.gz"
        })))
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    let location = pipeline.poll("r-1", Duration::from_secs(5)).await;
    assert_eq!(location.as_deref(), Some("https://example.com/report.gz"));
}

#[tokio::test]
async fn test_poll_returns_none_on_terminal_failure() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/reports/r-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processingStatus": "FAILURE"
        })))
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    assert_eq!(pipeline.poll("r-2", Duration::from_secs(5)).await, None);
}

#[tokio::test]
async fn test_poll_times_out_on_stuck_report() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/reports/r-3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "IN_PROGRESS"})),
        )
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    assert_eq!(pipeline.poll("r-3", Duration::from_millis(200)).await, None);
}

#[tokio::test]
async fn test_download_decodes_gzip_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download/report.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip_payload()))
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    let rows = pipeline
        .download(&format!("{}/download/report.gz", server.uri()))
        .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["keywordId"], "111");
    assert_eq!(rows[1]["cost"], "0.40");
}

#[tokio::test]
async fn test_download_gives_up_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    let rows = pipeline
        .download(&format!("{}/download/broken", server.uri()))
        .await;
    assert!(rows.is_empty());
}

/// Issues report ids derived from the requested report type so each
/// created job can be told apart while polling.
struct ReportIdByType;

impl Respond for ReportIdByType {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let type_id = body["configuration"]["reportTypeId"]
            .as_str()
            .unwrap_or("unknown")
            .to_string();
        ResponseTemplate::new(200).set_body_json(json!({"reportId": format!("r-{type_id}")}))
    }
}

#[tokio::test]
async fn test_run_parallel_creates_sequentially_and_collects_successes() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/reports"))
        .respond_with(ReportIdByType)
        .mount(&server)
        .await;

    // Campaign and keyword reports succeed, the target report fails
    for type_id in ["spCampaigns", "spKeywords"] {
        Mock::given(method("GET"))
            .and(path(format!("/reports/r-{type_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "location": format!("{}/download/report.gz", server.uri()),
            })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/reports/r-spTargets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "FAILURE"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/report.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip_payload()))
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    let requests = vec![
        ReportRequest {
            name: "campaign-perf".to_string(),
            report_type: "campaigns".to_string(),
            metrics: vec!["campaignId".to_string(), "cost".to_string()],
            date: None,
            segment: None,
        },
        keyword_report("keyword-perf"),
        ReportRequest {
            name: "target-perf".to_string(),
            report_type: "targets".to_string(),
            metrics: vec!["targetId".to_string()],
            date: None,
            segment: None,
        },
    ];

    let results = pipeline.run_parallel(&requests, 2).await;

    // Creation calls are strictly sequential and ordered
    let creations: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/reports" && r.method.to_string() == "POST")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["configuration"]["reportTypeId"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(creations, vec!["spCampaigns", "spKeywords", "spTargets"]);

    // The result map contains exactly the reports whose poll succeeded
    assert_eq!(results.len(), 2);
    assert!(results.contains_key("campaign-perf"));
    assert!(results.contains_key("keyword-perf"));
    assert!(!results.contains_key("target-perf"));
    assert_eq!(results["campaign-perf"].len(), 2);
}

#[tokio::test]
async fn test_status_normalizes_version_drift() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/reports/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processingStatus": "completed",
            "report": {"downloadUrl": "https://example.com/signed"}
        })))
        .mount(&server)
        .await;

    let pipeline = test_pipeline(&server);
    let location = pipeline.poll("r-drift", Duration::from_secs(5)).await;
    assert_eq!(location.as_deref(), Some("https://example.com/signed"));
}
