use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Send log output to a file; the terminal belongs to the UI. `RUST_LOG`
/// overrides the default `info` level.
pub fn init() -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("ai-druh");
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("druh.log");
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Could not install log subscriber: {}", e))?;

    Ok(log_path)
}
