//! `gitship analyze [REPO]` – extract history and preview records without
//! submitting anything.

use anyhow::{Context, Result};
use gitship_core::config::GitshipConfig;
use gitship_core::history::analyze_repo_async;
use gitship_core::record::{records_from_history, traceability_map};
use std::path::Path;

use crate::cli::FilterArgs;

pub async fn run_analyze(
    cfg: &GitshipConfig,
    repo: &Path,
    filters: &FilterArgs,
    output: Option<&Path>,
) -> Result<()> {
    let options = filters.merged_options(cfg)?;
    let history = analyze_repo_async(repo.to_path_buf(), options).await?;
    let records = records_from_history(&history);
    let trace = traceability_map(&records);

    println!("Repository: {}", history.repo_path.display());
    println!("Commits:    {}", history.commits.len());
    println!("References: {}", history.references.len());
    println!("Records:    {}", records.len());
    println!("Traceable:  {} distinct git objects", trace.len());

    println!();
    for record in records.iter().take(5) {
        println!("{} ({}): {}", record.git_hash, record.kind.as_str(), record.title);
    }
    if records.len() > 5 {
        println!("... and {} more", records.len() - 5);
    }

    if let Some(path) = output {
        let report = serde_json::json!({
            "history": history,
            "records": records,
            "traceability": trace,
        });
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Full analysis written to {}", path.display());
    }

    Ok(())
}
