//! Handler configuration
//!
//! Optional overrides are read from the platform-specific config folder:
//! - Linux: ~/.config/s3-url-handler/config.json
//! - Windows: %APPDATA%/s3-url-handler/config.json
//! - macOS: ~/Library/Application Support/s3-url-handler/config.json
//!
//! A missing file means defaults.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::s3::types::DEFAULT_REGION;

/// Settings for credential discovery and the SDK client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Profile tried first, before the SDK default chain
    pub profile_name: String,

    /// Region used when no source supplies one
    pub default_region: String,

    /// File name looked up in every search directory
    pub credentials_file_name: String,

    /// Replaces the built-in directory list when set
    pub search_dirs: Option<Vec<PathBuf>>,

    /// Custom S3-compatible endpoint (MinIO, LocalStack...)
    pub endpoint_url: Option<String>,

    pub force_path_style: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            profile_name: "artifacts".to_string(),
            default_region: DEFAULT_REGION.to_string(),
            credentials_file_name: ".s3credentials".to_string(),
            search_dirs: None,
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

impl HandlerConfig {
    /// Load the config from disk, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config: HandlerConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;

        tracing::info!(
            "Loaded config: profile={}, default_region={}, endpoint={:?}",
            config.profile_name,
            config.default_region,
            config.endpoint_url
        );

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "github.n-orlov", "s3-url-handler")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Directories probed for the credentials file, in order
    ///
    /// Current working directory, home, `<home>/.sbt`, `<home>/.coursier`.
    /// Entries that can't be determined on this machine are left out.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        if let Some(overrides) = &self.search_dirs {
            return overrides.clone();
        }

        let mut candidates = Vec::with_capacity(4);
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd);
        }
        if let Some(home) = dirs::home_dir() {
            let sbt = home.join(".sbt");
            let coursier = home.join(".coursier");
            candidates.extend([home, sbt, coursier]);
        }
        candidates
    }
}
