//! Status command - Display the local queue
//!
//! Provides the `leadq status` CLI command which:
//! 1. Shows how many leads are queued, split into pending and failed
//! 2. Lists the queued leads oldest first (with `--list`)

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use leadq_core::domain::lead::fields;
use leadq_core::domain::Record;

use super::{load_config, open_engine};
use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// List every queued lead
    #[arg(long)]
    pub list: bool,
}

impl StatusCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config = load_config(config_path)?;
        let (_db, engine) = open_engine(&config).await?;
        let records = engine
            .queued_records()
            .await
            .context("Failed to read the local queue")?;

        let failed = records.iter().filter(|r| r.is_failed()).count();
        let pending = records.len() - failed;

        if format.is_json() {
            let mut json = serde_json::json!({
                "queued": records.len(),
                "pending": pending,
                "failed": failed,
                "database": config.queue.database.display().to_string(),
            });
            if self.list {
                json["records"] = records.iter().map(record_json).collect();
            }
            formatter.print_json(&json);
            return Ok(());
        }

        if records.is_empty() {
            formatter.success("Queue is empty");
            return Ok(());
        }

        formatter.success(&format!(
            "{} lead{} queued on this device",
            records.len(),
            plural(records.len())
        ));
        formatter.info(&format!("Pending: {}", pending));
        formatter.info(&format!("Failed:  {}", failed));

        if failed > 0 {
            formatter.warn("Failed leads are not retried; export them before 'leadq clear'");
        }

        if self.list {
            formatter.info("");
            for record in &records {
                formatter.info(&record_line(record));
            }
        }

        Ok(())
    }
}

fn record_json(record: &Record) -> serde_json::Value {
    serde_json::json!({
        "id": record.id().to_string(),
        "captured_at": record.captured_at().to_rfc3339(),
        "attempts": record.attempts(),
        "state": record.state().name(),
        "payload": record.payload(),
    })
}

fn record_line(record: &Record) -> String {
    let payload = record.payload();
    format!(
        "{}  {:<7}  attempts={}  {} <{}>",
        record.captured_at().format("%Y-%m-%d %H:%M"),
        record.state().name(),
        record.attempts(),
        payload.get_str(fields::FULL_NAME).unwrap_or("?"),
        payload.get_str(fields::EMAIL).unwrap_or("?"),
    )
}
