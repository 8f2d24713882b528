//! CLI for the gitship history shipper.

mod commands;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use gitship_core::config::{self, GitshipConfig};
use gitship_core::history::HistoryOptions;
use std::path::PathBuf;

use commands::{run_analyze, run_check, run_init, run_submit};

/// Top-level CLI for the gitship history shipper.
#[derive(Debug, Parser)]
#[command(name = "gitship")]
#[command(about = "gitship: ship git history to an issue tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// History filters shared by `analyze` and `submit`. Config values apply
/// first; any flag that was given wins.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Walk at most this many commits (overrides the config value).
    #[arg(long, value_name = "N")]
    pub max_commits: Option<usize>,

    /// Analyze only this branch (repeatable).
    #[arg(long = "branch", value_name = "NAME")]
    pub branches: Vec<String>,

    /// Skip this branch (repeatable).
    #[arg(long = "exclude-branch", value_name = "NAME")]
    pub exclude_branches: Vec<String>,

    /// Keep only commits at or after this RFC 3339 time.
    #[arg(long, value_name = "TIME")]
    pub since: Option<String>,

    /// Keep only commits at or before this RFC 3339 time.
    #[arg(long, value_name = "TIME")]
    pub until: Option<String>,
}

impl FilterArgs {
    pub fn merged_options(&self, cfg: &GitshipConfig) -> Result<HistoryOptions> {
        let mut options = cfg.history_options();
        if let Some(n) = self.max_commits {
            options.max_commits = n;
        }
        if !self.branches.is_empty() {
            options.include_branches = self.branches.clone();
        }
        if !self.exclude_branches.is_empty() {
            options.exclude_branches = self.exclude_branches.clone();
        }
        if let Some(s) = &self.since {
            options.since = Some(parse_time("since", s)?);
        }
        if let Some(s) = &self.until {
            options.until = Some(parse_time("until", s)?);
        }
        Ok(options)
    }
}

fn parse_time(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid --{flag} value {value}, expected RFC 3339"))?;
    Ok(parsed.with_timezone(&Utc))
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Extract repository history and preview the records without submitting.
    Analyze {
        /// Path to the Git repository.
        #[arg(default_value = ".")]
        repo: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Write the full analysis as JSON to this file.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Extract history, shape records, and deliver them in one batch.
    Submit {
        /// Path to the Git repository.
        #[arg(default_value = ".")]
        repo: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Tracker project to file the issues under (overrides the config value).
        #[arg(long, value_name = "ID")]
        project_id: Option<String>,
    },

    /// Probe the ingest endpoint's health route.
    Check,

    /// Create the default config file and show where it lives.
    Init,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Analyze {
                repo,
                filters,
                output,
            } => run_analyze(&cfg, &repo, &filters, output.as_deref()).await?,
            CliCommand::Submit {
                repo,
                filters,
                project_id,
            } => run_submit(&cfg, &repo, &filters, project_id).await?,
            CliCommand::Check => run_check(&cfg).await?,
            CliCommand::Init => run_init(&cfg)?,
        }

        Ok(())
    }
}
