//! Configuration management for recdeck
//!
//! Handles config file loading/saving and server connection settings.
//! Config is stored at ~/.config/recdeck/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::{BackendSession, Credentials};
use crate::models::BackendVariant;
use crate::playback::INTERNAL_PLAYER;
use crate::related::DEFAULT_PAGE_SIZE;

const DEFAULT_SERVER_URL: &str = "http://localhost:8888";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the recording server
    pub server_url: String,
    /// Server API generation used for lists that don't come from a record
    pub api_version: BackendVariant,
    /// Basic auth user, if the server sits behind one
    pub username: Option<String>,
    pub password: Option<String>,
    /// Results fetched per related-row page
    pub page_size: u64,
    /// "internal" or the command of an external player
    pub player: String,
    /// Page opened when the external player is missing
    pub player_install_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_version: BackendVariant::default(),
            username: None,
            password: None,
            page_size: DEFAULT_PAGE_SIZE,
            player: INTERNAL_PLAYER.to_string(),
            player_install_url: "https://mpv.io/installation/".to_string(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/recdeck/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("recdeck").join("config.toml"))
    }

    /// Load config from the default path with environment overrides
    pub fn load() -> Self {
        let config = Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default();
        config.with_env()
    }

    /// Load config from a file, or return default if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Apply RECDECK_SERVER / RECDECK_USER / RECDECK_PASSWORD
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("RECDECK_SERVER") {
            self.server_url = url;
        }
        if let Ok(user) = std::env::var("RECDECK_USER") {
            self.username = Some(user);
        }
        if let Ok(pass) = std::env::var("RECDECK_PASSWORD") {
            self.password = Some(pass);
        }
        self
    }

    /// Basic auth credentials, when a user name is configured
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|u| Credentials {
            username: u.clone(),
            password: self.password.clone().unwrap_or_default(),
        })
    }

    /// Session for a specific API generation
    pub fn session(&self, variant: BackendVariant) -> BackendSession {
        BackendSession::new(variant, self.server_url.clone(), self.credentials())
    }

    /// Session for the configured API generation
    pub fn default_session(&self) -> BackendSession {
        self.session(self.api_version)
    }
}
