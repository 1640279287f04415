use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Context;
use owo_colors::OwoColorize;

use crate::cli::ReportFetchCommand;
use crate::context::AppContext;
use adlift_core::reports::{ReportRequest, ReportRow};

/// Create a performance report, wait for it and write the rows as CSV.
pub async fn fetch_report(context: &AppContext, cmd: &ReportFetchCommand) -> anyhow::Result<()> {
    let request = ReportRequest {
        name: cmd.report_type.clone(),
        report_type: cmd.report_type.clone(),
        metrics: cmd.metrics.clone(),
        date: cmd.date.clone(),
        segment: cmd.segment.clone(),
    };

    let Some(report_id) = context.reports.create(&request).await else {
        anyhow::bail!(
            "Report creation was rejected - check the report type/segment combination and date"
        );
    };
    println!("Created report {report_id}, waiting ...");

    let Some(location) = context.reports.wait_for_report(&report_id).await else {
        anyhow::bail!("Report {report_id} did not become ready in time");
    };

    let rows = context.reports.download(&location).await;
    if rows.is_empty() {
        println!("Report {report_id} contained no rows");
        return Ok(());
    }

    match &cmd.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_rows(file, &rows)?;
            println!(
                "{} Wrote {} rows to {}",
                "✓".green(),
                rows.len(),
                path.display()
            );
        }
        None => {
            write_rows(std::io::stdout(), &rows)?;
        }
    }
    Ok(())
}

/// Write report rows as CSV with a stable, sorted column order.
fn write_rows<W: Write>(out: W, rows: &[ReportRow]) -> anyhow::Result<()> {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&columns)?;
    for row in rows {
        let record: Vec<&str> = columns
            .iter()
            .map(|column| row.get(*column).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}
