//! Snapshot loading.
//!
//! Cluster, node and plan snapshots are read from YAML or JSON files. The
//! format is picked from the file extension; anything other than `.json`
//! is read as YAML, which also accepts JSON documents.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

/// Serialization format of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
}

/// Parser for snapshot files.
#[derive(Debug, Default)]
pub struct SnapshotParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl SnapshotFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl SnapshotParser {
    /// Creates a new snapshot parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a snapshot from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<T> {
        let path = self.resolve(path.as_ref());
        info!("Loading snapshot from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound { path }.into());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ConfigError::parse(
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            )
        })?;

        self.parse_str(&content, SnapshotFormat::from_path(&path), Some(&path))
    }

    /// Parses a snapshot from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn parse_str<T: DeserializeOwned>(
        &self,
        content: &str,
        format: SnapshotFormat,
        source: Option<&Path>,
    ) -> Result<T> {
        debug!("Parsing {:?} snapshot", format);
        let location = || source.map(|p| p.display().to_string());

        let value = match format {
            SnapshotFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::parse(format!("JSON parse error: {e}"), location()))?,
            SnapshotFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::parse(format!("YAML parse error: {e}"), location()))?,
        };
        Ok(value)
    }

    /// Renders a snapshot in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn render<T: Serialize>(&self, value: &T, format: SnapshotFormat) -> Result<String> {
        let rendered = match format {
            SnapshotFormat::Json => serde_json::to_string_pretty(value).map_err(|e| {
                ConfigError::SerializeError {
                    message: e.to_string(),
                }
            })?,
            SnapshotFormat::Yaml => {
                serde_yaml::to_string(value).map_err(|e| ConfigError::SerializeError {
                    message: e.to_string(),
                })?
            }
        };
        Ok(rendered)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.resolve(Path::new(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ConfigError::parse(
                    format!("Failed to load .env file: {e}"),
                    Some(env_path.display().to_string()),
                )
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
