//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Matchday generator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Cost of each cross-team pair that has already met.
    /// Should exceed a typical points gap between two teams.
    #[serde(default = "default_opponent_repeat_penalty")]
    pub opponent_repeat_penalty: u32,

    /// Node budget for the partner matching search before falling back
    #[serde(default = "default_max_search_nodes")]
    pub max_search_nodes: u64,
}

fn default_opponent_repeat_penalty() -> u32 {
    8
}

fn default_max_search_nodes() -> u64 {
    200_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            opponent_repeat_penalty: default_opponent_repeat_penalty(),
            max_search_nodes: default_max_search_nodes(),
        }
    }
}

/// Knockout bracket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketConfig {
    /// Players seeded into the bracket (at most 16)
    #[serde(default = "default_bracket_players")]
    pub max_players: usize,
}

fn default_bracket_players() -> usize {
    16
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            max_players: default_bracket_players(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub bracket: BracketConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            bracket: BracketConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.scheduler.max_search_nodes == 0 {
            return Err(ConfigError::ValidationError(
                "Scheduler search budget must be greater than 0".to_string(),
            ));
        }

        if !(4..=16).contains(&self.bracket.max_players) {
            return Err(ConfigError::ValidationError(
                "Bracket size must be between 4 and 16 players".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scheduler.opponent_repeat_penalty, 8);
        assert_eq!(config.bracket.max_players, 16);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_bracket_size() {
        let mut config = AppConfig::default();
        config.bracket.max_players = 32;
        assert!(config.validate().is_err());

        config.bracket.max_players = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_search_budget() {
        let mut config = AppConfig::default();
        config.scheduler.max_search_nodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            data_dir = "/srv/league"

            [scheduler]
            opponent_repeat_penalty = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/league"));
        assert_eq!(config.scheduler.opponent_repeat_penalty, 12);
        assert_eq!(config.scheduler.max_search_nodes, 200_000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.bracket.max_players, parsed.bracket.max_players);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
