use anyhow::Context;

use super::{colored_by_state, format_bid, render_table};
use crate::cli::AdGroupListCommand;
use crate::context::AppContext;

/// List ad groups, optionally restricted to one campaign
pub async fn list_ad_groups(context: &AppContext, cmd: &AdGroupListCommand) -> anyhow::Result<()> {
    let ad_groups = context
        .gateway
        .get_ad_groups(cmd.campaign_id, true)
        .await
        .context("Failed to get ad groups")?;

    if ad_groups.is_empty() {
        println!("No ad groups found");
        return Ok(());
    }

    let rows = ad_groups
        .iter()
        .map(|ad_group| {
            vec![
                ad_group.id.to_string(),
                ad_group.campaign_id.to_string(),
                colored_by_state(&ad_group.name, &ad_group.state),
                ad_group.state.to_string(),
                format_bid(ad_group.default_bid),
            ]
        })
        .collect();

    println!(
        "{}",
        render_table(
            vec!["Id", "Campaign", "Name", "State", "Default bid"],
            rows
        )
    );
    Ok(())
}
