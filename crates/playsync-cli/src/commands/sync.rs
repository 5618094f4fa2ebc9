use super::config::load_config;
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_sync_core::{connect_stores, RecordOutcome, SyncOrchestrator, SyncReport};
use serde_json::json;
use std::path::Path;

pub async fn run_sync(config_path: Option<&Path>, dry_run: bool, details: bool, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let config = load_config(config_path)?;

    let (source, target) = connect_stores(&config)
        .await
        .wrap_err("Failed to connect to the media libraries")?;

    let report = SyncOrchestrator::new(source, target, config.sync.clone())
        .with_dry_run(dry_run)
        .sync()
        .await
        .wrap_err("Sync operation failed")?;

    match output.format() {
        OutputFormat::Human => {
            if dry_run {
                output.warn("Dry-run mode: no changes were written to Jellyfin");
            }
            if details && !output.is_quiet() {
                println!("{}", outcome_table(&report));
            }
            output.success(summary_line(&report));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": true,
                "dry_run": report.dry_run,
                "watched": report.watched,
                "matched": report.matched,
                "inserted": report.inserted,
                "updated": report.updated,
                "skipped": report.skipped,
                "duration_seconds": report.duration.as_secs_f64(),
                "outcomes": if details { serde_json::to_value(&report.outcomes)? } else { serde_json::Value::Null },
            }));
        }
    }

    Ok(())
}

fn summary_line(report: &SyncReport) -> String {
    let verb = if report.dry_run { "would be" } else { "were" };
    format!(
        "Sync completed: {} watched files, {} matched ({} {} inserted, {} updated), {} skipped in {:?}",
        report.watched, report.matched, report.inserted, verb, report.updated, report.skipped, report.duration
    )
}

fn outcome_table(report: &SyncReport) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Outcome").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Kodi File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Jellyfin Item").add_attribute(comfy_table::Attribute::Bold),
    ]);

    for outcome in &report.outcomes {
        let row = match outcome {
            RecordOutcome::Inserted { file_path, item_id, .. } => {
                vec![Cell::new("inserted").fg(comfy_table::Color::Green), Cell::new(file_path), Cell::new(item_id)]
            }
            RecordOutcome::Updated { file_path, item_id, .. } => {
                vec![Cell::new("updated").fg(comfy_table::Color::Cyan), Cell::new(file_path), Cell::new(item_id)]
            }
            RecordOutcome::Skipped { file_path } => {
                vec![Cell::new("skipped").fg(comfy_table::Color::DarkGrey), Cell::new(file_path), Cell::new("-")]
            }
        };
        table.add_row(row);
    }

    table
}
