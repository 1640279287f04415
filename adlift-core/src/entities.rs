//! Remote-owned advertising entities and the mutation payloads for them.
//!
//! The API is the single source of truth for all of these; the gateway
//! only holds read-through caches. Response rows with unexpected shapes
//! are skipped with a warning instead of failing the whole fetch, since a
//! single malformed entity must not take down an automation run.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    Enabled,
    Paused,
    Archived,
}

impl EntityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Phrase,
    Broad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(rename = "campaignId")]
    pub id: u64,
    pub name: String,
    pub state: EntityState,
    #[serde(default)]
    pub daily_budget: f64,
    #[serde(default)]
    pub targeting_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroup {
    #[serde(rename = "adGroupId")]
    pub id: u64,
    pub campaign_id: u64,
    pub name: String,
    pub state: EntityState,
    #[serde(default)]
    pub default_bid: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    #[serde(rename = "keywordId")]
    pub id: u64,
    pub ad_group_id: u64,
    pub campaign_id: u64,
    #[serde(rename = "keywordText")]
    pub text: String,
    pub match_type: MatchType,
    pub state: EntityState,
    #[serde(default)]
    pub bid: f64,
}

/// Negative keywords use their own match types (`negativeExact`,
/// `negativePhrase`), kept as the raw string the API hands out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeKeyword {
    #[serde(rename = "keywordId")]
    pub id: u64,
    pub ad_group_id: u64,
    pub campaign_id: u64,
    pub keyword_text: String,
    pub match_type: String,
    pub state: EntityState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordUpdate {
    pub keyword_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<EntityState>,
}

impl KeywordUpdate {
    pub fn bid(keyword_id: u64, bid: f64) -> Self {
        Self {
            keyword_id,
            bid: Some((bid * 100.0).round() / 100.0),
            state: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCreate {
    pub campaign_id: u64,
    pub ad_group_id: u64,
    pub keyword_text: String,
    pub match_type: MatchType,
    pub state: EntityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeKeywordCreate {
    pub campaign_id: u64,
    pub ad_group_id: u64,
    pub keyword_text: String,
    /// `negativeExact` or `negativePhrase`
    pub match_type: String,
    pub state: EntityState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignUpdate {
    pub campaign_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<EntityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroupCreate {
    pub campaign_id: u64,
    pub name: String,
    pub state: EntityState,
    pub default_bid: f64,
}

/// A keyword suggestion for an ASIN from the recommendations endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRecommendation {
    #[serde(default)]
    pub keyword: String,
    #[serde(rename = "matchType", default = "default_match_type")]
    pub match_type: String,
    #[serde(rename = "bid", default = "default_suggested_bid")]
    pub suggested_bid: f64,
}

fn default_match_type() -> String {
    "broad".to_string()
}

fn default_suggested_bid() -> f64 {
    0.5
}

/// Decode a list response defensively: rows that do not match the expected
/// shape are logged and skipped.
pub(crate) fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>, entity: &str) -> Vec<T> {
    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<T>(row) {
            Ok(value) => parsed.push(value),
            Err(err) => warn!("Skipping malformed {} entry: {}", entity, err),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_campaign_deserializes_from_api_shape() {
        let campaign: Campaign = serde_json::from_value(json!({
            "campaignId": 111,
            "name": "Spring Sale",
            "state": "enabled",
            "dailyBudget": 25.0,
            "targetingType": "manual"
        }))
        .unwrap();

        assert_eq!(campaign.id, 111);
        assert_eq!(campaign.state, EntityState::Enabled);
        assert_eq!(campaign.daily_budget, 25.0);
    }

    #[test]
    fn test_parse_rows_skips_malformed_entries() {
        let rows = vec![
            json!({"campaignId": 1, "name": "a", "state": "enabled"}),
            json!({"name": "missing id"}),
            json!("not even an object"),
            json!({"campaignId": 2, "name": "b", "state": "paused", "dailyBudget": 5.0}),
        ];

        let campaigns: Vec<Campaign> = parse_rows(rows, "campaign");
        assert_eq!(campaigns.len(), 2);
        assert_eq!(campaigns[1].id, 2);
        assert_eq!(campaigns[1].state, EntityState::Paused);
    }

    #[test]
    fn test_keyword_update_serializes_without_empty_fields() {
        let update = KeywordUpdate::bid(42, 1.239);
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({"keywordId": 42, "bid": 1.24}));
    }

    #[test]
    fn test_keyword_roundtrip() {
        let keyword: Keyword = serde_json::from_value(json!({
            "keywordId": 9,
            "adGroupId": 8,
            "campaignId": 7,
            "keywordText": "organic soil",
            "matchType": "phrase",
            "state": "enabled",
            "bid": 0.75
        }))
        .unwrap();

        assert_eq!(keyword.text, "organic soil");
        assert_eq!(keyword.match_type, MatchType::Phrase);
    }

    #[test]
    fn test_recommendation_defaults() {
        let recommendation: KeywordRecommendation =
            serde_json::from_value(json!({"keyword": "potting mix"})).unwrap();
        assert_eq!(recommendation.match_type, "broad");
        assert_eq!(recommendation.suggested_bid, 0.5);
    }
}
