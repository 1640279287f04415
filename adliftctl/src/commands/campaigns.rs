use anyhow::Context;

use super::{colored_by_state, format_bid, render_table};
use crate::cli::CampaignListCommand;
use crate::context::AppContext;
use adlift_core::entities::EntityState;

fn parse_state(state: &str) -> anyhow::Result<EntityState> {
    match state.to_lowercase().as_str() {
        "enabled" => Ok(EntityState::Enabled),
        "paused" => Ok(EntityState::Paused),
        "archived" => Ok(EntityState::Archived),
        other => anyhow::bail!("Unknown state '{other}', expected enabled, paused or archived"),
    }
}

/// List campaigns, optionally filtered by state
pub async fn list_campaigns(context: &AppContext, cmd: &CampaignListCommand) -> anyhow::Result<()> {
    let state_filter = cmd.state.as_deref().map(parse_state).transpose()?;

    let campaigns = context
        .gateway
        .get_campaigns(state_filter, !cmd.no_cache)
        .await
        .context("Failed to get campaigns")?;

    if campaigns.is_empty() {
        println!("No campaigns found");
        return Ok(());
    }

    let rows = campaigns
        .iter()
        .map(|campaign| {
            vec![
                campaign.id.to_string(),
                colored_by_state(&campaign.name, &campaign.state),
                campaign.state.to_string(),
                format_bid(campaign.daily_budget),
                campaign.targeting_type.clone(),
            ]
        })
        .collect();

    println!(
        "{}",
        render_table(vec!["Id", "Name", "State", "Daily budget", "Targeting"], rows)
    );
    Ok(())
}
