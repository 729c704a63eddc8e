//! Configuration loading and typed config structures for Beyond Epic.
//!
//! The configuration lives in `beyond-epic.yaml` next to the binary's
//! working directory. Every field has a default matching the original game
//! balance, so a missing file or an empty document yields a playable game.

use std::path::Path;

use beyond_types::RarityTier;
use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `beyond-epic.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Session-level settings (seed, save path, default player name).
    #[serde(default)]
    pub game: GameSection,

    /// Auto-clicker pricing and timing.
    #[serde(default)]
    pub auto_clicker: AutoClickerConfig,

    /// Displayed timer refresh.
    #[serde(default)]
    pub timer: TimerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Custom rarity table. `None` uses the standard 30-tier table.
    #[serde(default)]
    pub rarities: Option<Vec<RarityTier>>,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `BEYOND_EPIC_SAVE_PATH` overrides `game.save_path`
    /// - `BEYOND_EPIC_SEED` overrides `game.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. A blank document yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.game.apply_env_overrides();
        Ok(config)
    }
}

/// Session-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameSection {
    /// Seed for the draw source. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Where `export` writes and `import` reads the save by default.
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Name given to players who never chose one.
    #[serde(default = "default_username")]
    pub default_username: String,
}

impl GameSection {
    /// Override session settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BEYOND_EPIC_SAVE_PATH") {
            self.save_path = val;
        }
        if let Ok(val) = std::env::var("BEYOND_EPIC_SEED") {
            match val.parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(e) => warn!(value = %val, error = %e, "ignoring invalid BEYOND_EPIC_SEED"),
            }
        }
    }
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            seed: None,
            save_path: default_save_path(),
            default_username: default_username(),
        }
    }
}

/// Auto-clicker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AutoClickerConfig {
    /// Trigger interval with a single auto-clicker, in milliseconds.
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Maximum number of auto-clickers a player can own.
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,

    /// Price of the first auto-clicker; each further one doubles it.
    #[serde(default = "default_base_cost")]
    pub base_cost: u64,
}

impl Default for AutoClickerConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: default_base_interval_ms(),
            max_stack: default_max_stack(),
            base_cost: default_base_cost(),
        }
    }
}

/// Displayed timer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// How often the displayed elapsed time is pushed to observers.
    #[serde(default = "default_display_refresh_ms")]
    pub display_refresh_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            display_refresh_ms: default_display_refresh_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_save_path() -> String {
    "beyond-epic-save.json".to_owned()
}

fn default_username() -> String {
    "Player".to_owned()
}

const fn default_base_interval_ms() -> u64 {
    2000
}

const fn default_max_stack() -> u32 {
    10
}

const fn default_base_cost() -> u64 {
    50
}

const fn default_display_refresh_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}
