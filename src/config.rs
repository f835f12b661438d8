use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ui::conversation::suggestions;

pub const DEFAULT_ENDPOINT: &str = "https://backend.avyaya.co/chat";
pub const ENDPOINT_ENV: &str = "NIVESH_ENDPOINT";

const DEFAULT_GREETING: &str =
    "Hello, I'm Nivesh, a financial AI agent. How may I assist you today?";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat backend URL receiving `{"input": ...}`
    pub endpoint: String,

    /// Request timeout in seconds, 0 disables it
    pub request_timeout_secs: u64,

    /// How long the "Copied!" badge stays visible
    pub copy_feedback_ms: u64,

    /// First agent message of every conversation
    pub greeting: String,

    /// Labels offered as prompt suggestions
    pub suggestions: Vec<String>,

    /// UI preferences
    pub ui: UiConfig,

    /// Nivesh home directory (config and log file)
    #[serde(skip)]
    pub nivesh_home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub tick_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            tick_ms: 150,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            copy_feedback_ms: 1200,
            greeting: DEFAULT_GREETING.to_string(),
            suggestions: suggestions::default_labels(),
            ui: UiConfig::default(),
            nivesh_home: home.join(".nivesh"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.nivesh/config.toml`, or from `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let nivesh_home = home.join(".nivesh");

        fs::create_dir_all(&nivesh_home)
            .context("Failed to create .nivesh directory")?;

        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| nivesh_home.join("config.toml"));

        let mut config = Self::load_from(&config_path)?;
        config.nivesh_home = nivesh_home;
        config.apply_env();
        Ok(config)
    }

    /// Parse a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
    }

    /// Override the endpoint (CLI flag)
    pub fn set_endpoint(&mut self, endpoint: String) {
        self.endpoint = endpoint;
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.ui.tick_ms.max(16))
    }

    pub fn log_path(&self) -> PathBuf {
        self.nivesh_home.join("nivesh.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.copy_feedback(), Duration::from_millis(1200));
        assert_eq!(config.suggestions.len(), 6);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "endpoint = \"http://localhost:8000/chat\"\nrequest_timeout_secs = 0\n\n[ui]\nshow_timestamps = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8000/chat");
        assert_eq!(config.request_timeout(), None);
        assert!(!config.ui.show_timestamps);
        assert_eq!(config.ui.tick_ms, 150);
        assert_eq!(config.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn save_then_load_keeps_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.suggestions = vec!["Momentum".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.suggestions, vec!["Momentum".to_string()]);
    }
}
