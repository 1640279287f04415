use anyhow::Context;
use owo_colors::OwoColorize;

use super::{colored_by_state, format_bid, render_table};
use crate::cli::VerifyCommand;
use crate::context::AppContext;

/// Verify API connectivity by retrieving a small campaign sample
pub async fn verify_connection(context: &AppContext, cmd: &VerifyCommand) -> anyhow::Result<()> {
    println!(
        "Verifying connection to {} ...",
        context.settings.base_url()
    );

    let report = context
        .gateway
        .verify_connection(cmd.sample_size)
        .await
        .context("Failed to verify the Amazon Ads API connection")?;

    let rows = report
        .sample
        .iter()
        .map(|campaign| {
            vec![
                campaign.id.to_string(),
                colored_by_state(&campaign.name, &campaign.state),
                campaign.state.to_string(),
                format_bid(campaign.daily_budget),
            ]
        })
        .collect();

    println!("{}", render_table(vec!["Id", "Name", "State", "Budget"], rows));
    println!(
        "{} Retrieved {} campaigns",
        "✓".green(),
        report.campaign_count
    );
    Ok(())
}
