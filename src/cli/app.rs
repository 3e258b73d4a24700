use crate::network::ClientConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server address as host:port
    pub server: String,
    pub nickname: String,
    pub username: String,
    pub realname: String,
    /// Channels to join after registration
    pub channels: Vec<String>,
    /// Queue, flood control and keepalive tuning
    pub client: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "irc.libera.chat:6667".to_string(),
            nickname: "tether".to_string(),
            username: "tether".to_string(),
            realname: "tether client".to_string(),
            channels: Vec::new(),
            client: ClientConfig::default(),
        }
    }
}

/// Command line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub channels: Vec<String>,
}

impl Config {
    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        ProjectDirs::from("dev", "tether", "tether")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Get the default config file path
    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, writing the defaults there if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        config
            .client
            .validate()
            .context("Invalid [client] section in configuration")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).context("Failed to write configuration file")?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Apply command line values on top of the loaded file
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(server) = overrides.server {
            self.server = server;
        }
        if let Some(nickname) = overrides.nickname {
            self.nickname = nickname;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(realname) = overrides.realname {
            self.realname = realname;
        }
        if !overrides.channels.is_empty() {
            self.channels = overrides.channels;
        }
    }
}
