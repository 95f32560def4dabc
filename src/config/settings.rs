use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::capture::ProtocolTag;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Invalid config file '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot write config file '{0}': {1}")]
    Write(PathBuf, #[source] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub analysis: AnalysisConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub extension: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Tags shown in the protocol distribution, in display order.
    pub protocols: Vec<ProtocolTag>,
    /// Load and derive captures on separate blocking tasks.
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointMarker {
    Braille,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub min_row_height: u16,
    pub marker: PointMarker,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: "pcapng".to_string(),
            directory: PathBuf::from("."),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            protocols: ProtocolTag::DEFAULT_DISTRIBUTION.to_vec(),
            parallel: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 250,
            min_row_height: 9,
            marker: PointMarker::Braille,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::Write(path.to_path_buf(), e))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies command-line overrides on top of file values.
    pub fn with_overrides(mut self, extension: Option<String>, directory: Option<PathBuf>) -> Self {
        if let Some(extension) = extension {
            self.discovery.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(directory) = directory {
            self.discovery.directory = directory;
        }
        self
    }
}
