//! Gateway facade: caching, chunked batch mutations and audit recording.

mod common;

use std::sync::Arc;

use adlift_core::audit::AuditSink;
use adlift_core::entities::{CampaignUpdate, EntityState, KeywordUpdate};
use adlift_core::gateway::AdsGateway;
use common::{mount_token_endpoint, request_count, test_requester};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn test_gateway(server: &MockServer) -> AdsGateway {
    AdsGateway::new(test_requester(server), Arc::new(AuditSink::new(".")))
}

fn campaign_rows() -> serde_json::Value {
    json!([
        {"campaignId": 1, "name": "one", "state": "enabled", "dailyBudget": 10.0, "targetingType": "manual"},
        {"campaignId": 2, "name": "two", "state": "paused", "dailyBudget": 5.0, "targetingType": "auto"}
    ])
}

/// Answers a batch mutation with one SUCCESS entry per submitted item.
struct EchoSuccess;

impl Respond for EchoSuccess {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let items: Vec<serde_json::Value> =
            serde_json::from_slice(&request.body).unwrap_or_default();
        let results: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                json!({
                    "code": "SUCCESS",
                    "keywordId": item.get("keywordId").cloned().unwrap_or(json!(0)),
                })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(results)
    }
}

#[tokio::test]
async fn test_campaigns_are_cached_until_invalidated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(campaign_rows()))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);

    let first = gateway.get_campaigns(None, true).await.unwrap();
    let second = gateway.get_campaigns(None, true).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(
        request_count(&server, "GET", "/sp/campaigns").await,
        1,
        "second read must be served from cache"
    );

    gateway.invalidate_campaigns_cache().await;
    gateway.get_campaigns(None, true).await.unwrap();
    assert_eq!(
        request_count(&server, "GET", "/sp/campaigns").await,
        2,
        "invalidate must force the next read to the network"
    );
}

#[tokio::test]
async fn test_filtered_campaign_reads_bypass_the_cache() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(campaign_rows()))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    gateway.get_campaigns(None, true).await.unwrap();

    // Filtered read goes to the network even with a warm cache
    gateway
        .get_campaigns(Some(EntityState::Enabled), true)
        .await
        .unwrap();
    assert_eq!(request_count(&server, "GET", "/sp/campaigns").await, 2);

    // And must not have replaced the cached full set
    gateway.get_campaigns(None, true).await.unwrap();
    assert_eq!(request_count(&server, "GET", "/sp/campaigns").await, 2);
}

#[tokio::test]
async fn test_state_filter_is_sent_as_query_param() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .and(query_param("stateFilter", "enabled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    gateway
        .get_campaigns(Some(EntityState::Enabled), false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_malformed_campaign_rows_are_skipped() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"campaignId": 1, "name": "ok", "state": "enabled"},
            {"name": "no id"},
            42
        ])))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let campaigns = gateway.get_campaigns(None, false).await.unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].id, 1);
}

#[tokio::test]
async fn test_non_list_response_is_no_data() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "unexpected shape"})),
        )
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let campaigns = gateway.get_campaigns(None, false).await.unwrap();
    assert!(campaigns.is_empty());
}

#[tokio::test]
async fn test_batch_update_chunks_by_one_hundred() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("PUT"))
        .and(path("/sp/keywords"))
        .respond_with(EchoSuccess)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let updates: Vec<KeywordUpdate> = (1..=250)
        .map(|id| KeywordUpdate::bid(id, 0.50))
        .collect();

    let outcome = gateway.batch_update_keywords(&updates).await;

    assert_eq!(outcome.total, 250);
    assert_eq!(outcome.success, 250);
    assert_eq!(outcome.failed, 0);
    assert_eq!(
        request_count(&server, "PUT", "/sp/keywords").await,
        3,
        "250 items must be submitted as ceil(250/100) = 3 chunks"
    );
}

#[tokio::test]
async fn test_empty_batch_issues_no_requests() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let gateway = test_gateway(&server);
    let outcome = gateway.batch_update_keywords(&[]).await;

    assert_eq!(outcome.total, 0);
    assert_eq!(outcome.success, 0);
    assert_eq!(outcome.failed, 0);
    assert_eq!(request_count(&server, "PUT", "/sp/keywords").await, 0);
}

#[tokio::test]
async fn test_partial_failure_is_an_aggregate_not_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("PUT"))
        .and(path("/sp/keywords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "SUCCESS", "keywordId": 1},
            {"code": "INVALID_ARGUMENT", "keywordId": 2, "details": "bid too low"},
            {"code": "SUCCESS", "keywordId": 3}
        ])))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let updates = vec![
        KeywordUpdate::bid(1, 0.5),
        KeywordUpdate::bid(2, 0.01),
        KeywordUpdate::bid(3, 0.8),
    ];
    let outcome = gateway.batch_update_keywords(&updates).await;

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.success, 2);
    assert_eq!(outcome.failed, 1);
    assert!(!outcome.all_succeeded());
}

#[tokio::test]
async fn test_whole_chunk_transport_failure_marks_items_failed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("PUT"))
        .and(path("/sp/keywords"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let updates = vec![KeywordUpdate::bid(1, 0.5), KeywordUpdate::bid(2, 0.6)];
    let outcome = gateway.batch_update_keywords(&updates).await;

    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.success, 0);
    assert_eq!(outcome.failed, 2);
}

#[tokio::test]
async fn test_campaign_update_invalidates_cache_before_returning() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(campaign_rows()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/sp/campaigns"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"code": "SUCCESS", "campaignId": 1}])),
        )
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    gateway.get_campaigns(None, true).await.unwrap();

    let outcome = gateway
        .update_campaign(CampaignUpdate {
            campaign_id: 1,
            state: Some(EntityState::Paused),
            daily_budget: None,
        })
        .await;
    assert!(outcome.all_succeeded());

    gateway.get_campaigns(None, true).await.unwrap();
    assert_eq!(
        request_count(&server, "GET", "/sp/campaigns").await,
        2,
        "a read after a successful mutation must hit the network"
    );
}

#[tokio::test]
async fn test_mutations_are_audited() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("PUT"))
        .and(path("/sp/keywords"))
        .respond_with(EchoSuccess)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let updates = vec![KeywordUpdate::bid(1, 0.5), KeywordUpdate::bid(2, 0.6)];
    gateway.batch_update_keywords(&updates).await;

    assert_eq!(gateway.audit().len(), 2);
}

#[tokio::test]
async fn test_unfiltered_keywords_iterate_campaigns() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/sp/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(campaign_rows()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sp/keywords"))
        .and(query_param("campaignIdFilter", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"keywordId": 11, "adGroupId": 5, "campaignId": 1, "keywordText": "soil",
             "matchType": "broad", "state": "enabled", "bid": 0.4}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sp/keywords"))
        .and(query_param("campaignIdFilter", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"keywordId": 22, "adGroupId": 6, "campaignId": 2, "keywordText": "fertilizer",
             "matchType": "exact", "state": "enabled", "bid": 0.9}
        ])))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let keywords = gateway.get_keywords(None, None).await.unwrap();

    assert_eq!(keywords.len(), 2);
    assert_eq!(request_count(&server, "GET", "/sp/keywords").await, 2);
}
