// Configuration for the choredice CLI
//
// Stored as YAML in:
// - Linux: ~/.config/choredice/choredice.yml
// - macOS: ~/Library/Application Support/choredice/choredice.yml
// - Windows: %APPDATA%\choredice\choredice.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::session::RollTiming;
use crate::storage::BackendKind;

const APP_NAME: &str = "choredice";
const CONFIG_FILE: &str = "choredice.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the chore database
    pub data_dir: PathBuf,

    /// Storage backend for the snapshot
    pub backend: BackendKind,

    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Show the tumbling die before revealing a roll
    pub animate: bool,

    /// Milliseconds between tumbling faces
    pub roll_interval_ms: u64,

    /// Total tumbling time in milliseconds
    pub roll_duration_ms: u64,

    /// Pause between the final face and the chore reveal
    pub reveal_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let timing = RollTiming::default();
        Self {
            data_dir: Self::default_data_dir(),
            backend: BackendKind::default(),
            log_level: "warn".to_string(),
            animate: true,
            roll_interval_ms: timing.interval_ms,
            roll_duration_ms: timing.duration_ms,
            reveal_delay_ms: timing.reveal_delay_ms,
        }
    }
}

impl Config {
    /// Platform data directory, or `.choredice` under the working directory
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_NAME)))
    }

    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load from an explicit path (which must exist) or the default location
    /// (which may be missing)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse config file {:?}", path))?;
        debug!(file = ?path, "Loaded config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    pub fn timing(&self) -> RollTiming {
        RollTiming {
            interval_ms: self.roll_interval_ms,
            duration_ms: self.roll_duration_ms,
            reveal_delay_ms: self.reveal_delay_ms,
        }
    }
}
