//! Configuration file parsing and structures.
//!
//! coverdeck uses TOML for declarative configuration: the dashboard's card
//! list, seed attributes for the entities the host tracks, logging, and the
//! HTTP surface.

use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use tracing_subscriber::filter::LevelFilter;

use crate::host::EntityAttributes;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub api: ApiConfig,

    /// Cards in dashboard order.
    #[serde(default)]
    pub cards: Vec<CardEntry>,

    /// Seed attributes for tracked entities, keyed by entity id.
    ///
    /// In a full deployment these arrive from an upstream state source; a
    /// standalone instance seeds them here and mutates them through the API.
    #[serde(default)]
    pub entities: HashMap<String, EntityAttributes>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,
}

/// HTTP surface configuration
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Address to bind, e.g. "127.0.0.1"
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8654
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
        }
    }
}

/// One card on the dashboard.
///
/// The `entity` field is kept optional at the parsing layer; card factories
/// validate it so a missing entity surfaces as a descriptive card error at
/// startup rather than a TOML error.
#[derive(Debug, Clone, Deserialize)]
pub struct CardEntry {
    /// Card type tag, e.g. "loxone-cover".
    #[serde(rename = "type")]
    pub kind: String,

    /// Entity this card is bound to.
    #[serde(default)]
    pub entity: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let config: Config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate constraints the TOML schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (entity_id, attributes) in &self.entities {
            attributes
                .validate()
                .map_err(|e| ConfigError::InvalidEntity(entity_id.clone(), e))?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid attributes for entity {0}: {1}")]
    InvalidEntity(String, #[source] crate::host::state::InvalidAttributes),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [logging]
            level = "debug"

            [[cards]]
            type = "loxone-cover"
            entity = "cover.kitchen"

            [entities."cover.kitchen"]
            friendly_name = "Kitchen Blind"
            current_position = 42
            uuid = "abc-1"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.cards.len(), 1);
        assert_eq!(config.cards[0].kind, "loxone-cover");
        assert_eq!(config.cards[0].entity, "cover.kitchen");

        let kitchen = config.entities.get("cover.kitchen").unwrap();
        assert_eq!(kitchen.friendly_name, "Kitchen Blind");
        assert_eq!(kitchen.current_position, 42);
        assert!(!kitchen.shade_mode);
        assert_eq!(kitchen.room, None);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.api.listen, "127.0.0.1");
        assert_eq!(config.api.port, 8654);
        assert!(config.cards.is_empty());
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_card_entry_without_entity_parses() {
        // Validation happens at card construction, not here.
        let toml = r#"
            [[cards]]
            type = "loxone-cover"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cards[0].entity, "");
    }

    #[test]
    fn test_seeded_position_above_100_is_rejected() {
        let toml = r#"
            [entities."cover.kitchen"]
            friendly_name = "Kitchen Blind"
            current_position = 200
            uuid = "abc-1"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEntity(entity, _)) if entity == "cover.kitchen"
        ));
    }

    #[test]
    fn test_from_file_rejects_invalid_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverdeck.toml");
        std::fs::write(
            &path,
            r#"
            [entities."cover.kitchen"]
            friendly_name = "Kitchen Blind"
            current_position = 101
            uuid = "abc-1"
        "#,
        )
        .unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::InvalidEntity(_, _))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverdeck.toml");
        std::fs::write(
            &path,
            r#"
            [api]
            listen = "0.0.0.0"
            port = 9000
        "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api.listen, "0.0.0.0");
        assert_eq!(config.api.port, 9000);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/coverdeck.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
