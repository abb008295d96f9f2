//! Clear command - Delete every queued lead
//!
//! Removal is irreversible, so the command asks for confirmation unless
//! `--yes` is given. In JSON mode there is no prompt and `--yes` is required.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use super::{load_config, open_engine};
use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl ClearCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config = load_config(config_path)?;
        let (_db, engine) = open_engine(&config).await?;

        // An undecodable queue can still be cleared.
        let queued = match engine.queue_count().await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Queue unreadable");
                None
            }
        };

        if queued == Some(0) {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({ "removed": 0 }));
            } else {
                formatter.success("Queue is already empty");
            }
            return Ok(());
        }

        if !self.yes {
            if format.is_json() {
                formatter.error("Refusing to clear without --yes in JSON mode");
                anyhow::bail!("confirmation required");
            }

            let question = match queued {
                Some(n) => format!("Delete {} queued lead{}? This cannot be undone", n, plural(n)),
                None => "The queue is unreadable. Delete it? This cannot be undone".to_string(),
            };
            let stdin = std::io::stdin();
            if !confirm(&question, &mut stdin.lock())? {
                formatter.info("Nothing deleted");
                return Ok(());
            }
        }

        let removed = engine
            .clear_queue()
            .await
            .context("Failed to clear the local queue")?;
        info!(removed, "Queue cleared");

        // A queue that could not be counted reports `null`.
        let removed = queued.map(|_| removed);
        if format.is_json() {
            formatter.print_json(&serde_json::json!({ "removed": removed }));
        } else {
            match removed {
                Some(n) => formatter.success(&format!("Deleted {} lead{}", n, plural(n))),
                None => formatter.success("Deleted the unreadable queue"),
            }
        }

        Ok(())
    }
}

/// Asks a yes/no question; anything but `y`/`yes` means no
fn confirm(question: &str, input: &mut impl BufRead) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush().context("Failed to write prompt")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
