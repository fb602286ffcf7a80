// Settings persistence
use anyhow::{Context, Result};
use ee_cop2_core::{RenderOptions, TARGET_PROCESSOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default load address of raw images (start of EE user memory).
pub const DEFAULT_BASE_ADDRESS: u32 = 0x0010_0000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub render: RenderOptions,
    /// Processor module name handed to the activation gate
    pub processor: String,
    pub base_address: u32,
    /// Print the raw instruction word in front of every listing line
    pub show_raw_words: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            processor: TARGET_PROCESSOR.to_string(),
            base_address: DEFAULT_BASE_ADDRESS,
            show_raw_words: true,
        }
    }
}

impl CliConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("ee-cop2");
        path.push("config.json");
        path
    }

    /// Load from `path`, or from the default location; defaults when the file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        Ok(path)
    }
}
