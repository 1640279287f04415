use anyhow::Context;

use super::{colored_by_state, format_bid, render_table};
use crate::cli::{KeywordListCommand, NegativeKeywordListCommand};
use crate::context::AppContext;

/// List keywords. Without a filter this iterates every campaign, which can
/// take a while on large accounts.
pub async fn list_keywords(context: &AppContext, cmd: &KeywordListCommand) -> anyhow::Result<()> {
    let keywords = context
        .gateway
        .get_keywords(cmd.campaign_id, cmd.ad_group_id)
        .await
        .context("Failed to get keywords")?;

    if keywords.is_empty() {
        println!("No keywords found");
        return Ok(());
    }

    let rows = keywords
        .iter()
        .map(|keyword| {
            vec![
                keyword.id.to_string(),
                keyword.campaign_id.to_string(),
                colored_by_state(&keyword.text, &keyword.state),
                format!("{:?}", keyword.match_type).to_lowercase(),
                keyword.state.to_string(),
                format_bid(keyword.bid),
            ]
        })
        .collect();

    println!(
        "{}",
        render_table(
            vec!["Id", "Campaign", "Keyword", "Match", "State", "Bid"],
            rows
        )
    );
    Ok(())
}

/// List negative keywords
pub async fn list_negative_keywords(
    context: &AppContext,
    cmd: &NegativeKeywordListCommand,
) -> anyhow::Result<()> {
    let negatives = context
        .gateway
        .get_negative_keywords(cmd.campaign_id)
        .await
        .context("Failed to get negative keywords")?;

    if negatives.is_empty() {
        println!("No negative keywords found");
        return Ok(());
    }

    let rows = negatives
        .iter()
        .map(|negative| {
            vec![
                negative.id.to_string(),
                negative.campaign_id.to_string(),
                negative.keyword_text.clone(),
                negative.match_type.clone(),
                negative.state.to_string(),
            ]
        })
        .collect();

    println!(
        "{}",
        render_table(vec!["Id", "Campaign", "Keyword", "Match", "State"], rows)
    );
    Ok(())
}
