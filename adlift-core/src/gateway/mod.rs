//! The gateway facade implementing the query/mutate contract.
//!
//! Decision engines talk to [`AdsGateway`]; all outbound traffic funnels
//! through the shared [`Requester`]. Reads serve the entity caches where
//! possible, writes go through the chunked batch path and invalidate the
//! affected cache before returning, so a prior write is never masked by a
//! stale read.

mod batch;
mod cache;

pub use batch::{BatchOutcome, MutationResult, MAX_CHUNK_SIZE};
pub use cache::EntityCache;

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::audit::{AuditEntry, AuditSink};
use crate::entities::{
    parse_rows, AdGroup, AdGroupCreate, Campaign, CampaignUpdate, EntityState, Keyword,
    KeywordCreate, KeywordRecommendation, KeywordUpdate, NegativeKeyword, NegativeKeywordCreate,
};
use crate::http::{HttpError, Requester, RequestError};

/// Result of a connectivity probe against the campaigns endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub campaign_count: usize,
    pub sample: Vec<Campaign>,
}

pub struct AdsGateway {
    requester: Arc<Requester>,
    audit: Arc<AuditSink>,
    campaigns: EntityCache<Campaign>,
    ad_groups: EntityCache<AdGroup>,
}

impl AdsGateway {
    pub fn new(requester: Arc<Requester>, audit: Arc<AuditSink>) -> Self {
        Self {
            requester,
            audit,
            campaigns: EntityCache::new("campaigns"),
            ad_groups: EntityCache::new("ad groups"),
        }
    }

    pub fn requester(&self) -> &Arc<Requester> {
        &self.requester
    }

    pub fn audit(&self) -> &Arc<AuditSink> {
        &self.audit
    }

    /// Record a mutation proposed by a caller that knows the old value and
    /// the reason. Gateway-initiated mutations log their own entries.
    pub fn log_audit(&self, entry: AuditEntry) {
        self.audit.log(entry);
    }

    // ------------------------------------------------------------------
    // Campaigns
    // ------------------------------------------------------------------

    /// Get campaigns, served from cache when `use_cache` is set and no
    /// state filter is applied. Filtered results are never cached since
    /// they are not the canonical full set.
    pub async fn get_campaigns(
        &self,
        state_filter: Option<EntityState>,
        use_cache: bool,
    ) -> Result<Vec<Campaign>, RequestError> {
        if use_cache && state_filter.is_none() {
            if let Some(cached) = self.campaigns.get().await {
                return Ok(cached);
            }
        }

        let mut query = Vec::new();
        if let Some(state) = state_filter {
            query.push(("stateFilter", state.as_str().to_string()));
        }

        let rows = self.fetch_rows("/v2/sp/campaigns", &query, "campaigns").await?;
        let campaigns: Vec<Campaign> = parse_rows(rows, "campaign");
        info!("Retrieved {} campaigns", campaigns.len());

        if state_filter.is_none() {
            self.campaigns.store(campaigns.clone()).await;
        }
        Ok(campaigns)
    }

    pub async fn invalidate_campaigns_cache(&self) {
        self.campaigns.invalidate().await;
    }

    /// Update one campaign (state and/or budget). The campaigns cache is
    /// invalidated before returning so the next read reflects the change.
    pub async fn update_campaign(&self, update: CampaignUpdate) -> BatchOutcome {
        self.audit_mutations("CAMPAIGN_UPDATE", "CAMPAIGN", std::slice::from_ref(&update), |u| {
            u.campaign_id.to_string()
        });

        let updates = [update];
        let (outcome, _) =
            batch::submit_chunks(&self.requester, Method::PUT, "/v2/sp/campaigns", &updates).await;
        if outcome.success > 0 {
            self.campaigns.invalidate().await;
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Ad groups
    // ------------------------------------------------------------------

    /// Get ad groups, cached only for the unfiltered full set.
    pub async fn get_ad_groups(
        &self,
        campaign_id: Option<u64>,
        use_cache: bool,
    ) -> Result<Vec<AdGroup>, RequestError> {
        if use_cache && campaign_id.is_none() {
            if let Some(cached) = self.ad_groups.get().await {
                return Ok(cached);
            }
        }

        let mut query = Vec::new();
        if let Some(id) = campaign_id {
            query.push(("campaignIdFilter", id.to_string()));
        }

        let rows = self.fetch_rows("/v2/sp/adGroups", &query, "ad groups").await?;
        let ad_groups: Vec<AdGroup> = parse_rows(rows, "ad group");
        info!("Retrieved {} ad groups", ad_groups.len());

        if campaign_id.is_none() {
            self.ad_groups.store(ad_groups.clone()).await;
        }
        Ok(ad_groups)
    }

    pub async fn invalidate_ad_groups_cache(&self) {
        self.ad_groups.invalidate().await;
    }

    /// Create a new ad group, returning its id on success.
    pub async fn create_ad_group(&self, create: AdGroupCreate) -> Option<u64> {
        self.audit_mutations("AD_GROUP_CREATE", "AD_GROUP", std::slice::from_ref(&create), |c| {
            c.name.clone()
        });

        let creates = [create];
        let (outcome, ids) =
            batch::submit_chunks(&self.requester, Method::POST, "/v2/sp/adGroups", &creates).await;
        if outcome.success > 0 {
            self.ad_groups.invalidate().await;
        }
        ids.into_iter().next()
    }

    // ------------------------------------------------------------------
    // Keywords
    // ------------------------------------------------------------------

    /// Get keywords. The remote endpoint requires a campaign or ad-group
    /// filter; without one, all campaigns are iterated sequentially and
    /// per-campaign failures are logged and skipped.
    pub async fn get_keywords(
        &self,
        campaign_id: Option<u64>,
        ad_group_id: Option<u64>,
    ) -> Result<Vec<Keyword>, RequestError> {
        if campaign_id.is_none() && ad_group_id.is_none() {
            let campaigns = self.get_campaigns(None, true).await?;
            info!("Fetching keywords from {} campaigns", campaigns.len());

            let mut all_keywords = Vec::new();
            for campaign in &campaigns {
                match self.fetch_keywords(Some(campaign.id), None).await {
                    Ok(mut keywords) => all_keywords.append(&mut keywords),
                    Err(err) => {
                        error!(
                            "Failed to get keywords for campaign {}: {}",
                            campaign.id, err
                        );
                    }
                }
            }
            info!(
                "Retrieved {} keywords from {} campaigns",
                all_keywords.len(),
                campaigns.len()
            );
            return Ok(all_keywords);
        }

        self.fetch_keywords(campaign_id, ad_group_id).await
    }

    async fn fetch_keywords(
        &self,
        campaign_id: Option<u64>,
        ad_group_id: Option<u64>,
    ) -> Result<Vec<Keyword>, RequestError> {
        let mut query = Vec::new();
        if let Some(id) = campaign_id {
            query.push(("campaignIdFilter", id.to_string()));
        }
        if let Some(id) = ad_group_id {
            query.push(("adGroupIdFilter", id.to_string()));
        }

        let rows = self.fetch_rows("/v2/sp/keywords", &query, "keywords").await?;
        Ok(parse_rows(rows, "keyword"))
    }

    /// Batch update keyword bids/states in chunks of at most 100.
    pub async fn batch_update_keywords(&self, updates: &[KeywordUpdate]) -> BatchOutcome {
        self.audit_mutations("KEYWORD_UPDATE", "KEYWORD", updates, |u| {
            u.keyword_id.to_string()
        });

        let (outcome, _) =
            batch::submit_chunks(&self.requester, Method::PUT, "/v2/sp/keywords", updates).await;
        outcome
    }

    /// Batch create keywords in chunks of at most 100.
    pub async fn batch_create_keywords(&self, creates: &[KeywordCreate]) -> BatchOutcome {
        self.audit_mutations("KEYWORD_CREATE", "KEYWORD", creates, |c| {
            c.keyword_text.clone()
        });

        let (outcome, _) =
            batch::submit_chunks(&self.requester, Method::POST, "/v2/sp/keywords", creates).await;
        outcome
    }

    /// Update a single keyword bid through the batch path, for consistent
    /// behavior and telemetry with bulk updates.
    pub async fn update_keyword_bid(
        &self,
        keyword_id: u64,
        bid: f64,
        state: Option<EntityState>,
    ) -> bool {
        let mut update = KeywordUpdate::bid(keyword_id, bid);
        update.state = state;
        let outcome = self.batch_update_keywords(std::slice::from_ref(&update)).await;
        outcome.success == 1
    }

    // ------------------------------------------------------------------
    // Negative keywords
    // ------------------------------------------------------------------

    pub async fn get_negative_keywords(
        &self,
        campaign_id: Option<u64>,
    ) -> Result<Vec<NegativeKeyword>, RequestError> {
        let mut query = Vec::new();
        if let Some(id) = campaign_id {
            query.push(("campaignIdFilter", id.to_string()));
        }

        let rows = self
            .fetch_rows("/v2/sp/negativeKeywords", &query, "negative keywords")
            .await?;
        Ok(parse_rows(rows, "negative keyword"))
    }

    pub async fn create_negative_keywords(
        &self,
        creates: &[NegativeKeywordCreate],
    ) -> BatchOutcome {
        self.audit_mutations("NEGATIVE_KEYWORD_CREATE", "NEGATIVE_KEYWORD", creates, |c| {
            c.keyword_text.clone()
        });

        let (outcome, _) = batch::submit_chunks(
            &self.requester,
            Method::POST,
            "/v2/sp/negativeKeywords",
            creates,
        )
        .await;
        outcome
    }

    // ------------------------------------------------------------------
    // Keyword recommendations
    // ------------------------------------------------------------------

    /// Get suggested keywords for an ASIN.
    pub async fn keyword_recommendations(
        &self,
        asin: &str,
        max_suggestions: usize,
    ) -> Result<Vec<KeywordRecommendation>, RequestError> {
        let payload = json!({
            "asins": [asin],
            "maxRecommendations": max_suggestions,
        });

        let response = self
            .requester
            .post_json("/v2/sp/targets/keywords/recommendations", &payload)
            .await?;
        let data: Value = response
            .json()
            .await
            .map_err(|e| RequestError::Http(HttpError::ParseError(e.to_string())))?;

        let rows = data
            .get("recommendations")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let recommendations: Vec<KeywordRecommendation> = parse_rows(rows, "recommendation");
        info!(
            "Retrieved {} keyword suggestions for ASIN {}",
            recommendations.len(),
            asin
        );
        Ok(recommendations)
    }

    // ------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------

    /// Verify API connectivity by retrieving a small campaign sample.
    pub async fn verify_connection(
        &self,
        sample_size: usize,
    ) -> Result<ConnectionReport, RequestError> {
        let query = [
            ("startIndex", "0".to_string()),
            ("count", sample_size.max(1).to_string()),
        ];
        let rows = self.fetch_rows("/v2/sp/campaigns", &query, "campaigns").await?;
        let campaigns: Vec<Campaign> = parse_rows(rows, "campaign");

        info!(
            "Amazon Ads API connectivity verified, retrieved {} campaigns",
            campaigns.len()
        );
        Ok(ConnectionReport {
            campaign_count: campaigns.len(),
            sample: campaigns.into_iter().take(sample_size).collect(),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn fetch_rows(
        &self,
        path: &str,
        query: &[(&str, String)],
        entity: &str,
    ) -> Result<Vec<Value>, RequestError> {
        let response = self.requester.get(path, query).await?;
        let data: Value = response
            .json()
            .await
            .map_err(|e| RequestError::Http(HttpError::ParseError(e.to_string())))?;

        match data {
            Value::Array(rows) => Ok(rows),
            other => {
                warn!(
                    "Unexpected {} response format: {}",
                    entity,
                    json_type_name(&other)
                );
                Ok(Vec::new())
            }
        }
    }

    fn audit_mutations<T: Serialize>(
        &self,
        action_type: &str,
        entity_type: &str,
        items: &[T],
        entity_id: impl Fn(&T) -> String,
    ) {
        for item in items {
            let new_value = serde_json::to_string(item).unwrap_or_default();
            self.audit.log(AuditEntry::new(
                action_type,
                entity_type,
                entity_id(item),
                "",
                new_value,
                "gateway mutation",
                false,
            ));
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
