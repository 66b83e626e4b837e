//! Profile store: the profiles, the active pointer and two recency histories.
//!
//! Invariants kept by every operation:
//! - a profile named "default" exists and cannot be removed
//! - the active name references an existing profile
//! - each history is unique, most recent first, at most [`HISTORY_LIMIT`] long
//!
//! Mutations are applied to a copy, persisted, and only then become visible, so a
//! returned `Ok` means the new state is on disk and an error leaves nothing changed.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::state::{absolute, ConfigFile, Profile, StateError};

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_PREFIX: &str = "dl/TTSH-";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_LOCALE: &str = "ru";
pub const HISTORY_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("No active profile")]
    NoActiveProfile,
    #[error("Profile name cannot be empty")]
    InvalidName,
    #[error("Profile already exists: {0}")]
    NameConflict(String),
    #[error("The default profile cannot be removed")]
    CannotRemoveDefault,
    #[error("The last remaining profile cannot be removed")]
    CannotRemoveLast,
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
    #[error(transparent)]
    Persist(#[from] StateError),
}

#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    config: ConfigFile,
}

impl ProfileStore {
    /// Load the store from `path`. Without a config file a single "default"
    /// profile bound to `fallback_dir` is created and written.
    pub fn open(path: PathBuf, fallback_dir: &Path) -> Result<Self, StateError> {
        match ConfigFile::load(&path)? {
            Some(config) => {
                let config = normalize(config, fallback_dir);
                info!(path = %path.display(), active = %config.current_profile, "Profiles loaded");
                Ok(Self { path, config })
            }
            None => {
                let config = synthesize(fallback_dir);
                config.save(&path)?;
                info!(path = %path.display(), "Created default profile");
                Ok(Self { path, config })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn active(&self) -> Result<&Profile, ProfileError> {
        find(&self.config, &self.config.current_profile).ok_or(ProfileError::NoActiveProfile)
    }

    pub fn active_name(&self) -> &str {
        &self.config.current_profile
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.config.profiles
    }

    pub fn prefix_history(&self) -> &[String] {
        &self.config.prefix_history
    }

    pub fn directory_history(&self) -> &[PathBuf] {
        &self.config.directory_history
    }

    /// Append a profile and make it active.
    pub fn add_profile(
        &mut self,
        name: &str,
        branch_prefix: &str,
        remote_name: &str,
        working_directory: &Path,
        locale: &str,
    ) -> Result<(), ProfileError> {
        let profile = Profile::new(name, branch_prefix, remote_name, working_directory, locale)?;
        self.mutate(|config| {
            if find(config, &profile.name).is_some() {
                return Err(ProfileError::NameConflict(profile.name.clone()));
            }
            config.current_profile = profile.name.clone();
            config.profiles.push(profile);
            Ok(())
        })?;
        info!(profile = %self.config.current_profile, "Profile added");
        Ok(())
    }

    /// Remove a profile; removing the active one re-activates "default".
    pub fn remove_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        self.mutate(|config| {
            if name == DEFAULT_PROFILE {
                return Err(ProfileError::CannotRemoveDefault);
            }
            if config.profiles.len() <= 1 {
                return Err(ProfileError::CannotRemoveLast);
            }
            let index = config
                .profiles
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| ProfileError::ProfileNotFound(name.to_string()))?;
            config.profiles.remove(index);
            if config.current_profile == name {
                config.current_profile = DEFAULT_PROFILE.to_string();
            }
            Ok(())
        })?;
        info!(profile = name, "Profile removed");
        Ok(())
    }

    pub fn switch_active(&mut self, name: &str) -> Result<(), ProfileError> {
        self.mutate(|config| {
            if find(config, name).is_none() {
                return Err(ProfileError::ProfileNotFound(name.to_string()));
            }
            config.current_profile = name.to_string();
            Ok(())
        })?;
        info!(profile = name, "Switched profile");
        Ok(())
    }

    /// Use `prefix` for the active profile and move it to the front of the history.
    pub fn record_prefix(&mut self, prefix: &str) -> Result<(), ProfileError> {
        self.mutate(|config| {
            active_mut(config)?.branch_prefix = prefix.to_string();
            push_recent(&mut config.prefix_history, prefix.to_string());
            Ok(())
        })
    }

    /// Use `dir` for the active profile and move it to the front of the history.
    pub fn record_directory(&mut self, dir: &Path) -> Result<(), ProfileError> {
        let dir = absolute(dir);
        self.mutate(|config| {
            active_mut(config)?.working_directory = dir.clone();
            push_recent(&mut config.directory_history, dir);
            Ok(())
        })
    }

    pub fn clear_prefix_history(&mut self) -> Result<(), ProfileError> {
        self.mutate(|config| {
            let current = active_mut(config)?.branch_prefix.clone();
            config.prefix_history = vec![current];
            Ok(())
        })
    }

    pub fn clear_directory_history(&mut self) -> Result<(), ProfileError> {
        self.mutate(|config| {
            let current = active_mut(config)?.working_directory.clone();
            config.directory_history = vec![current];
            Ok(())
        })
    }

    pub fn set_remote(&mut self, remote: &str) -> Result<(), ProfileError> {
        self.mutate(|config| {
            active_mut(config)?.remote_name = remote.to_string();
            Ok(())
        })
    }

    pub fn set_locale(&mut self, locale: &str) -> Result<(), ProfileError> {
        self.mutate(|config| {
            active_mut(config)?.locale = locale.to_string();
            Ok(())
        })
    }

    fn mutate<F>(&mut self, change: F) -> Result<(), ProfileError>
    where
        F: FnOnce(&mut ConfigFile) -> Result<(), ProfileError>,
    {
        let mut next = self.config.clone();
        change(&mut next)?;
        if let Err(e) = next.save(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist profiles");
            return Err(e.into());
        }
        self.config = next;
        Ok(())
    }
}

fn find<'c>(config: &'c ConfigFile, name: &str) -> Option<&'c Profile> {
    config.profiles.iter().find(|p| p.name == name)
}

fn active_mut(config: &mut ConfigFile) -> Result<&mut Profile, ProfileError> {
    let name = config.current_profile.clone();
    config
        .profiles
        .iter_mut()
        .find(|p| p.name == name)
        .ok_or(ProfileError::NoActiveProfile)
}

fn push_recent<T: PartialEq>(history: &mut Vec<T>, value: T) {
    history.retain(|v| *v != value);
    history.insert(0, value);
    history.truncate(HISTORY_LIMIT);
}

fn default_profile(dir: &Path) -> Profile {
    Profile {
        name: DEFAULT_PROFILE.to_string(),
        branch_prefix: DEFAULT_PREFIX.to_string(),
        remote_name: DEFAULT_REMOTE.to_string(),
        working_directory: absolute(dir),
        locale: DEFAULT_LOCALE.to_string(),
    }
}

fn synthesize(dir: &Path) -> ConfigFile {
    let profile = default_profile(dir);
    ConfigFile {
        prefix_history: vec![profile.branch_prefix.clone()],
        directory_history: vec![profile.working_directory.clone()],
        current_profile: profile.name.clone(),
        profiles: vec![profile],
    }
}

/// Repair a loaded file so the store invariants hold.
fn normalize(mut config: ConfigFile, fallback_dir: &Path) -> ConfigFile {
    let mut seen = Vec::new();
    config.profiles.retain(|p| {
        let keep = !p.name.trim().is_empty() && !seen.contains(&p.name);
        if keep {
            seen.push(p.name.clone());
        }
        keep
    });

    if find(&config, DEFAULT_PROFILE).is_none() {
        warn!("Config has no default profile, recreating it");
        config.profiles.insert(0, default_profile(fallback_dir));
    }
    if find(&config, &config.current_profile).is_none() {
        warn!(active = %config.current_profile, "Active profile missing, using default");
        config.current_profile = DEFAULT_PROFILE.to_string();
    }

    config.prefix_history = dedupe_bounded(config.prefix_history);
    config.directory_history = dedupe_bounded(config.directory_history);

    if let Some(active) = find(&config, &config.current_profile).cloned() {
        if config.prefix_history.is_empty() {
            config.prefix_history.push(active.branch_prefix);
        }
        if config.directory_history.is_empty() {
            config.directory_history.push(active.working_directory);
        }
    }
    config
}

fn dedupe_bounded<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len().min(HISTORY_LIMIT));
    for value in values {
        if out.len() == HISTORY_LIMIT {
            break;
        }
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
