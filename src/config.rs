// ⚙️ Clinic Configuration - data directory, file names, CSV delimiter
//
// Read from a TOML file (`vet-records.toml` by default). Every field has a
// default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "vet-records.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// CSV field delimiter, a single ASCII character
    pub delimiter: char,

    /// Directory every file name below is resolved against
    pub data_dir: PathBuf,

    pub animals_csv: String,
    pub owners_csv: String,
    pub vaccines_csv: String,

    pub animals_snapshot: String,
    pub owners_snapshot: String,

    /// Target of the expired-vaccine export
    pub expired_report: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            data_dir: PathBuf::from("data"),
            animals_csv: "animals.csv".to_string(),
            owners_csv: "owners.csv".to_string(),
            vaccines_csv: "vaccines.csv".to_string(),
            animals_snapshot: "animals.bin".to_string(),
            owners_snapshot: "owners.bin".to_string(),
            expired_report: "expired_vaccines.txt".to_string(),
        }
    }
}

impl ClinicConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config.delimiter_byte()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// The delimiter as the byte the CSV codec expects
    pub fn delimiter_byte(&self) -> std::result::Result<u8, ConfigError> {
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }

    pub fn animals_csv_path(&self) -> PathBuf {
        self.data_dir.join(&self.animals_csv)
    }

    pub fn owners_csv_path(&self) -> PathBuf {
        self.data_dir.join(&self.owners_csv)
    }

    pub fn vaccines_csv_path(&self) -> PathBuf {
        self.data_dir.join(&self.vaccines_csv)
    }

    pub fn animals_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.animals_snapshot)
    }

    pub fn owners_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.owners_snapshot)
    }

    pub fn expired_report_path(&self) -> PathBuf {
        self.data_dir.join(&self.expired_report)
    }
}
