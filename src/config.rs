//! Client configuration.

use crate::controller::Timings;
use crate::error::ConfigError;
use crate::{PlayerType, Players};
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ClientConfig::server_url`].
pub const SERVER_URL_ENV: &str = "TICTACTOE_SERVER_URL";

/// A player type offered by the selection form.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
pub struct PlayerTypeInfo {
    /// Identifier sent to the server.
    #[new(into)]
    name: String,
    /// Shown next to the name.
    #[serde(default)]
    #[new(into)]
    description: String,
}

/// Configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[setters(into)]
pub struct ClientConfig {
    /// Base URL of the game server.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Round trips faster than this never show the waiting line.
    #[serde(default = "default_waiting_delay_ms")]
    waiting_delay_ms: u64,

    /// Pause before requesting an automated move.
    #[serde(default = "default_computer_move_delay_ms")]
    computer_move_delay_ms: u64,

    /// Options of the selection form, in display order.
    #[serde(default = "default_player_types")]
    player_types: Vec<PlayerTypeInfo>,

    /// Initial choice for X.
    #[serde(default = "default_x")]
    default_x: String,

    /// Initial choice for O.
    #[serde(default = "default_o")]
    default_o: String,
}

fn default_server_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_waiting_delay_ms() -> u64 {
    500
}

fn default_computer_move_delay_ms() -> u64 {
    100
}

#[instrument]
fn default_player_types() -> Vec<PlayerTypeInfo> {
    vec![
        PlayerTypeInfo::new("Human", "Human Player"),
        PlayerTypeInfo::new("Random", "Random Player"),
        PlayerTypeInfo::new("TD", "Temporal Difference Learning Player"),
        PlayerTypeInfo::new("TDS", "Temporal Difference Symmetric Learning Player"),
    ]
}

fn default_x() -> String {
    "Human".to_string()
}

fn default_o() -> String {
    "Random".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            waiting_delay_ms: default_waiting_delay_ms(),
            computer_move_delay_ms: default_computer_move_delay_ms(),
            player_types: default_player_types(),
            default_x: default_x(),
            default_o: default_o(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }

    /// Defaults, overlaid by `path` if it exists, then by the environment.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            debug!("Config file not found, using defaults");
            Self::default()
        };
        Ok(config.apply_env())
    }

    /// Applies `TICTACTOE_SERVER_URL` if set.
    pub fn apply_env(self) -> Self {
        let url = std::env::var(SERVER_URL_ENV).ok();
        self.override_server_url(url.as_deref())
    }

    /// Replaces the server URL unless `url` is missing or blank.
    #[instrument(skip(self))]
    pub fn override_server_url(self, url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => {
                info!(server_url = %url, "Overriding server URL");
                self.with_server_url(url)
            }
            _ => self,
        }
    }

    /// Checks the option list against the defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_types.is_empty() {
            return Err(ConfigError::new("player_types must not be empty"));
        }
        for default in [&self.default_x, &self.default_o] {
            if !self.player_types.iter().any(|t| t.name() == default) {
                return Err(ConfigError::new(format!(
                    "Default player type {:?} is not in player_types",
                    default
                )));
            }
        }
        Ok(())
    }

    /// Controller delays.
    pub fn timings(&self) -> Timings {
        Timings::new(
            Duration::from_millis(self.waiting_delay_ms),
            Duration::from_millis(self.computer_move_delay_ms),
        )
    }

    /// Initial assignment of the selection form.
    pub fn default_players(&self) -> Players {
        Players::new(
            PlayerType::from(self.default_x.as_str()),
            PlayerType::from(self.default_o.as_str()),
        )
    }
}
