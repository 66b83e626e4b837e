//! Persisted configuration file
//!
//! Layout:
//! `{ "profiles": [...], "currentProfile": "...", "prefix_history": [...], "dir_history": [...] }`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::store::ProfileError;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "BRANCHDECK_CONFIG";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read config: {0}")]
    ReadError(String),
    #[error("Failed to write config: {0}")]
    WriteError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// A named bundle of working directory, branch prefix, remote and locale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    #[serde(rename = "Prefix", default)]
    pub branch_prefix: String,
    #[serde(rename = "DefaultRemote", default = "default_remote")]
    pub remote_name: String,
    #[serde(rename = "WorkDir")]
    pub working_directory: PathBuf,
    #[serde(rename = "Locale", default = "default_locale")]
    pub locale: String,
}

fn default_remote() -> String {
    super::store::DEFAULT_REMOTE.to_string()
}

fn default_locale() -> String {
    super::store::DEFAULT_LOCALE.to_string()
}

impl Profile {
    /// Build a profile; the name must be non-empty and a relative directory is
    /// resolved against the current directory.
    pub fn new(
        name: &str,
        branch_prefix: &str,
        remote_name: &str,
        working_directory: &Path,
        locale: &str,
    ) -> Result<Self, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::InvalidName);
        }

        Ok(Self {
            name: name.to_string(),
            branch_prefix: branch_prefix.to_string(),
            remote_name: remote_name.to_string(),
            working_directory: absolute(working_directory),
            locale: locale.to_string(),
        })
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// On-disk shape of the profile store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(rename = "currentProfile", default)]
    pub current_profile: String,
    #[serde(default)]
    pub prefix_history: Vec<String>,
    #[serde(rename = "dir_history", default)]
    pub directory_history: Vec<PathBuf>,
}

impl ConfigFile {
    /// `~/.branchdeck/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".branchdeck").join("config.json"))
    }

    /// Load from disk; `Ok(None)` when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(path).map_err(|e| StateError::ReadError(e.to_string()))?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StateError::ParseError(e.to_string()))
    }

    /// Rewrite the whole file atomically: write a sibling temp file, then rename.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StateError::WriteError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| StateError::WriteError(e.to_string()))?;

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, content).map_err(|e| StateError::WriteError(e.to_string()))?;
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StateError::WriteError(e.to_string())
        })
    }
}
