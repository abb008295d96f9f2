//! Submit command - Capture one lead
//!
//! Provides the `leadq submit` CLI command which:
//! 1. Builds a `LeadForm` from the flags and validates it
//! 2. Probes the endpoint to decide whether a live send is worth trying
//! 3. Hands the submission to the sync engine, which delivers or queues it

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use leadq_core::domain::{DomainError, LeadForm};
use leadq_core::usecases::CaptureLeadUseCase;
use leadq_sync::engine::SubmitOutcome;
use leadq_sync::SyncError;
use tracing::info;

use super::Session;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Visitor's full name
    #[arg(long)]
    pub name: String,

    /// Visitor's email address
    #[arg(long)]
    pub email: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub company: String,

    #[arg(long, default_value = "")]
    pub job_title: String,

    #[arg(long, default_value = "")]
    pub country: String,

    /// Product of interest (repeatable)
    #[arg(long = "interest")]
    pub interests: Vec<String>,

    /// How the visitor found the booth
    #[arg(long, default_value = "")]
    pub source: String,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Preferred follow-up (e.g. "email", "call")
    #[arg(long, default_value = "")]
    pub follow_up: String,

    /// The visitor agreed to be contacted
    #[arg(long)]
    pub consent: bool,
}

impl SubmitCommand {
    pub fn to_form(&self) -> LeadForm {
        LeadForm {
            full_name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            company: self.company.clone(),
            job_title: self.job_title.clone(),
            country: self.country.clone(),
            product_interest: self.interests.clone(),
            lead_source: self.source.clone(),
            notes: self.notes.clone(),
            follow_up: self.follow_up.clone(),
            consent: self.consent,
        }
    }

    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let session = Session::open(config_path).await?;
        let capture = CaptureLeadUseCase::new(session.identity.clone());

        let submission = match capture.execute(self.to_form()).await {
            Ok(submission) => submission,
            Err(e) => {
                if let Some(domain) = e.downcast_ref::<DomainError>() {
                    formatter.error(&domain.to_string());
                    anyhow::bail!("Lead rejected: {}", domain);
                }
                return Err(e);
            }
        };

        let reachable = session.refresh_reachability().await;
        info!(reachable, "Submitting lead");

        match session.engine.submit(submission).await {
            Ok(SubmitOutcome::Delivered) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "outcome": "delivered",
                    }));
                } else {
                    formatter.success("Lead sent");
                }
                Ok(())
            }
            Ok(SubmitOutcome::SavedLocally {
                record_id,
                online_attempt_failed,
            }) => {
                let queued = session.engine.queue_count().await.unwrap_or_default();
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "outcome": "saved_locally",
                        "record_id": record_id.to_string(),
                        "online_attempt_failed": online_attempt_failed.as_ref().map(ToString::to_string),
                        "queued": queued,
                    }));
                } else {
                    formatter.success("Lead saved on this device");
                    if let Some(reason) = &online_attempt_failed {
                        formatter.warn(&format!("Live send failed: {}", reason));
                    }
                    formatter.info(&format!("Record: {}", record_id));
                    formatter.info(&format!(
                        "{} lead(s) waiting; run 'leadq sync' when online",
                        queued
                    ));
                }
                Ok(())
            }
            Err(e @ SyncError::NotPersisted { .. }) => {
                formatter.error(&e.to_string());
                if let Some(payload) = e.unsaved_payload() {
                    // Surface the data so the operator can re-enter it.
                    let json = serde_json::to_string_pretty(payload)
                        .context("Failed to render unsaved lead")?;
                    eprintln!("{}", json);
                }
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
