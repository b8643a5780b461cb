//! Server configuration from the environment
//!
//! | variable      | default                          |
//! |---------------|----------------------------------|
//! | `RR_ADDR`     | `0.0.0.0:8000`                   |
//! | `RR_DATA_DIR` | `<platform data dir>/race-replay` |
//! | `RR_DEMO`     | unset (file provider)            |
//! | `RR_CONFIG`   | unset (built-in replay defaults) |

use anyhow::{Context, Result};
use rr_core::provider::TelemetryProvider;
use rr_core::ReplayConfig;
use rr_provider::{DemoProvider, FileProvider};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Read and validate a replay config JSON file
pub fn read_replay_config(path: &Path) -> Result<ReplayConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay config {}", path.display()))?;
    ReplayConfig::from_json_str(&json)
        .with_context(|| format!("Failed to load replay config {}", path.display()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub demo: bool,
    pub replay_config: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so tests need not touch the process env
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = lookup("RR_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid RR_ADDR: {addr}"))?;

        let data_dir = lookup("RR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(FileProvider::default_root);

        let demo = lookup("RR_DEMO")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no"))
            .unwrap_or(false);

        Ok(Self {
            addr,
            data_dir,
            demo,
            replay_config: lookup("RR_CONFIG").map(PathBuf::from),
        })
    }

    pub fn load_replay_config(&self) -> Result<ReplayConfig> {
        match &self.replay_config {
            Some(path) => read_replay_config(path),
            None => Ok(ReplayConfig::default()),
        }
    }

    pub fn build_provider(&self) -> Arc<dyn TelemetryProvider> {
        if self.demo {
            info!("Using demo provider");
            Arc::new(DemoProvider::new())
        } else {
            info!(data_dir = %self.data_dir.display(), "Using file provider");
            Arc::new(FileProvider::new(&self.data_dir))
        }
    }
}
