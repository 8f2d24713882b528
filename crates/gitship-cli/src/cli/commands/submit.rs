//! `gitship submit [REPO]` – extract history, shape records, and deliver
//! them as one batch.

use anyhow::{bail, Context, Result};
use gitship_core::config::GitshipConfig;
use gitship_core::history::analyze_repo_async;
use gitship_core::payload::BatchPayload;
use gitship_core::record::records_from_history;
use gitship_core::submit::Submitter;
use gitship_core::transport::HttpTransport;
use std::path::Path;

use crate::cli::FilterArgs;

pub async fn run_submit(
    cfg: &GitshipConfig,
    repo: &Path,
    filters: &FilterArgs,
    project_id: Option<String>,
) -> Result<()> {
    let options = filters.merged_options(cfg)?;
    let history = analyze_repo_async(repo.to_path_buf(), options).await?;
    let records = records_from_history(&history);
    println!(
        "Submitting {} records ({} commits, {} references) to {}...",
        records.len(),
        history.commits.len(),
        history.references.len(),
        cfg.endpoint
    );

    let project = project_id.or_else(|| cfg.project_id.clone());
    let payload = BatchPayload::from_records(&records, &history.repo_path, project);
    payload.validate().context("batch failed validation")?;

    let transport = HttpTransport::new(&cfg.endpoint, cfg.api_key.clone())?;
    let mut submitter = Submitter::new(transport, cfg.retry_policy()?, cfg.rate_limit()?);
    let result = submitter.submit(&payload).await;

    if result.success {
        println!("Batch accepted on attempt {}.", result.attempt_number);
        Ok(())
    } else {
        bail!(
            "submission failed after {} attempt(s): {}",
            result.attempt_number,
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
}
