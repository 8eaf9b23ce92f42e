/// The user configuration directory (`~/.cpu`) and its `config.json`.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::exec::{CommandTable, CpuError};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "CPU_HOME";

const CONFIG_FILE: &str = "config.json";
const DEFAULT_MANIFEST_FILE: &str = "default_manifest.json";
const GLOBAL_MANIFEST_FILE: &str = "global_manifest.json";

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Compile and run commands by source extension.
    #[serde(default)]
    pub commands: CommandTable,
    /// Show test input and output next to each other rather than stacked.
    #[serde(default = "default_side_by_side")]
    pub display_io_side_by_side: bool,
}

fn default_side_by_side() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commands: CommandTable::default(),
            display_io_side_by_side: default_side_by_side(),
        }
    }
}

impl Config {
    /// Load `config.json` from `dir`.
    ///
    /// # Errors
    ///
    /// - `CpuError::ConfigNotFound` — the file does not exist
    /// - `CpuError::InvalidConfig` — the file is not a valid config
    /// - `CpuError::Io` — the file cannot be read
    pub fn load_from(dir: &Path) -> Result<Self, CpuError> {
        let path = dir.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CpuError::ConfigNotFound { path });
            }
            Err(e) => return Err(CpuError::io("cannot read", path, e)),
        };
        let config: Self = serde_json::from_str(&text)
            .map_err(|source| CpuError::InvalidConfig { path: path.clone(), source })?;
        debug!(path = %path.display(), languages = config.commands.0.len(), "config loaded");
        Ok(config)
    }
}

/// Resolve the configuration directory: `$CPU_HOME`, else `~/.cpu`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cpu")
}

/// Template copied into every new problem, if present.
#[must_use]
pub fn default_manifest_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_MANIFEST_FILE)
}

/// Programs shared by every problem, if present.
#[must_use]
pub fn global_manifest_path(dir: &Path) -> PathBuf {
    dir.join(GLOBAL_MANIFEST_FILE)
}
