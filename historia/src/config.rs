use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::envelope::{ParseOptions, TotalRowPolicy};
use crate::errors::ConfigError;
use crate::geo::SanitizeOptions;

/// Configuration stored in `historia.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoriaConfig {
    #[serde(default)]
    pub envelope: EnvelopeSettings,
    #[serde(default)]
    pub geo: SanitizeOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeSettings {
    #[serde(default)]
    pub total_row: TotalRowPolicy,
}

impl EnvelopeSettings {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            total_row: self.total_row,
        }
    }
}

impl HistoriaConfig {
    pub const FILE_NAME: &'static str = "historia.toml";

    /// Load configuration from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `historia.toml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::default_path(dir);
        if path.exists() {
            log::debug!("loading config from {}", path.display());
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(Self::FILE_NAME)
    }
}
