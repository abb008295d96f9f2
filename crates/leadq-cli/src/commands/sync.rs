//! Sync command - Drain the local queue once
//!
//! Provides the `leadq sync` CLI command which:
//! 1. Opens the queue and creates the endpoint client
//! 2. Probes the endpoint
//! 3. Runs one drain pass and displays the summary

use std::path::Path;

use anyhow::Result;
use clap::Args;
use leadq_core::ports::DrainSummary;
use leadq_sync::engine::DrainStatus;
use tracing::info;

use super::Session;
use crate::output::{get_formatter, plural, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Skip the connectivity probe and try the endpoint directly
    #[arg(long)]
    pub force: bool,
}

impl SyncCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let session = Session::open(config_path).await?;

        if self.force {
            session.engine.set_reachable(true).await;
        } else if !session.refresh_reachability().await {
            let queued = session.engine.queue_count().await?;
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "status": "offline",
                    "queued": queued,
                }));
            } else {
                formatter.warn("Endpoint unreachable, nothing sent");
                formatter.info(&format!("{} lead{} still queued", queued, plural(queued)));
            }
            return Ok(());
        }

        info!("Draining local queue");
        let status = session.engine.drain().await?;

        if format.is_json() {
            formatter.print_json(&status_json(&status));
            return Ok(());
        }

        match status {
            DrainStatus::Offline => formatter.warn("Endpoint unreachable, nothing sent"),
            DrainStatus::AlreadyRunning => formatter.warn("Another sync is already running"),
            DrainStatus::Empty => formatter.success("Nothing to send"),
            DrainStatus::Completed(summary) => print_summary(&*formatter, &summary),
        }

        Ok(())
    }
}

fn status_json(status: &DrainStatus) -> serde_json::Value {
    match status {
        DrainStatus::Offline => serde_json::json!({ "status": "offline" }),
        DrainStatus::AlreadyRunning => serde_json::json!({ "status": "already_running" }),
        DrainStatus::Empty => serde_json::json!({ "status": "empty" }),
        DrainStatus::Completed(summary) => serde_json::json!({
            "status": "completed",
            "synced": summary.synced,
            "remaining": summary.remaining,
            "failed": summary.failed,
            "newly_failed": summary.newly_failed,
            "interrupted": summary.interrupted,
            "duration_ms": summary.duration_ms,
        }),
    }
}

fn print_summary(formatter: &dyn OutputFormatter, summary: &DrainSummary) {
    let duration = if summary.duration_ms >= 1000 {
        format!("{:.1}s", summary.duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", summary.duration_ms)
    };

    if summary.is_clean() {
        formatter.success(&format!(
            "Sent {} lead{} in {}",
            summary.synced,
            plural(summary.synced),
            duration
        ));
    } else {
        formatter.success(&format!("Sync finished in {}", duration));
        formatter.info(&format!("Sent:      {}", summary.synced));
        formatter.info(&format!("Remaining: {}", summary.remaining));
    }

    if summary.newly_failed > 0 {
        formatter.warn(&format!(
            "{} lead{} ran out of retries and will not be sent again",
            summary.newly_failed,
            plural(summary.newly_failed)
        ));
    }
    if summary.failed > 0 {
        formatter.info(&format!(
            "{} failed lead{} kept on this device (see 'leadq status')",
            summary.failed,
            plural(summary.failed)
        ));
    }
    if summary.interrupted {
        formatter.warn("Connection lost during sync; the rest stays queued");
    }
}
