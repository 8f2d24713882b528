//! `gitship init` – create the default config file and show its location.

use anyhow::Result;
use gitship_core::config::{self, GitshipConfig};
use gitship_core::logging;

pub fn run_init(cfg: &GitshipConfig) -> Result<()> {
    // load_or_init already wrote the default file on first run.
    let path = config::config_path()?;
    println!("Config file: {}", path.display());
    println!("Log file:    {}", logging::log_path()?.display());
    println!("Endpoint:    {}", cfg.endpoint);
    println!("Max commits: {}", cfg.max_commits);
    if cfg.api_key.is_none() {
        println!("No api_key set; submissions will go out unauthenticated.");
    }
    Ok(())
}
