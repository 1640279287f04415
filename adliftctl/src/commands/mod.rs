pub mod ad_groups;
pub mod campaigns;
pub mod keywords;
pub mod reports;
pub mod verify;

use adlift_core::entities::EntityState;
use owo_colors::OwoColorize;
use tabled::{builder::Builder, settings::Style};

/// Color an entity name by its state, matching the table's State column
pub fn colored_by_state(name: &str, state: &EntityState) -> String {
    match state {
        EntityState::Enabled => name.green().to_string(),
        EntityState::Paused => name.blue().to_string(),
        EntityState::Archived => name.dimmed().to_string(),
    }
}

/// Render a rounded table from a header row and data rows
pub fn render_table(header: Vec<&str>, rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn format_bid(bid: f64) -> String {
    format!("${bid:.2}")
}
