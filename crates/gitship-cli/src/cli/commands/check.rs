//! `gitship check` – probe the ingest endpoint's health route.

use anyhow::{bail, Result};
use gitship_core::config::GitshipConfig;
use gitship_core::transport::HttpTransport;

pub async fn run_check(cfg: &GitshipConfig) -> Result<()> {
    let transport = HttpTransport::new(&cfg.endpoint, cfg.api_key.clone())?;
    if transport.health_check().await {
        println!("Endpoint {} is healthy.", cfg.endpoint);
        Ok(())
    } else {
        bail!("endpoint {} failed its health check", cfg.endpoint);
    }
}
