//! Configuration loading and validation.
//!
//! Every field has a default, so an empty (or missing) TOML file is a valid config.
//! `HOST`, `PORT` and `DATA_FILE` environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Env var naming the TOML config file.
pub const CONFIG_ENV_VAR: &str = "BADMINTON_CONFIG";
/// Config file picked up from the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "badminton.toml";
/// Largest accepted `swap_wait_tolerance_minutes` (one day).
pub const MAX_SWAP_WAIT_TOLERANCE_MINUTES: i64 = 24 * 60;
/// Largest accepted `exhaustive_max_players`. C(40, 4) is about 91k groups.
pub const MAX_EXHAUSTIVE_PLAYERS: usize = 40;

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

/// How candidate groups of four are chosen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStrategy {
    /// Priority group, then single-player swaps.
    PrioritySwap,
    /// Every group of four in shuffled order.
    Exhaustive,
    /// Priority and swaps first, exhaustive search for small pools if that found nothing perfect.
    #[default]
    Auto,
}

/// Pairing engine constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Times two players may have shared a side (or faced each other) before it counts as a violation.
    pub repeat_limit: u32,
    /// Skill margin over the opposing team's average that makes a game "light".
    pub light_game_margin: u8,
    /// Light games a player may already have before another one is a violation.
    pub light_game_limit: u32,
    /// Largest skill difference a perfect matchup may have.
    pub perfect_skill_diff: u32,
    /// How much later a substitute may have started waiting than the player they replace.
    pub swap_wait_tolerance_minutes: i64,
    /// Largest pool the exhaustive search runs on. Bigger pools use priority and swaps only.
    pub exhaustive_max_players: usize,
    pub strategy: PairingStrategy,
    /// Seed for the shuffled group order. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            repeat_limit: 2,
            light_game_margin: 2,
            light_game_limit: 2,
            perfect_skill_diff: 1,
            swap_wait_tolerance_minutes: 10,
            exhaustive_max_players: 12,
            strategy: PairingStrategy::Auto,
            seed: None,
        }
    }
}

/// Fees used by the cost report.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Flat court fee per player per session.
    pub daily_fee: f64,
    /// Price of one shuttlecock, split between the four players who used it.
    pub shuttlecock_fee: f64,
}

impl CostRates {
    /// Fees must be finite and not negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fee_ok = |v: f64| v.is_finite() && v >= 0.0;
        if !fee_ok(self.daily_fee) || !fee_ok(self.shuttlecock_fee) {
            return Err(ConfigError::ValidationError(
                "fees must be finite and not negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            daily_fee: 70.0,
            shuttlecock_fee: 25.0,
        }
    }
}

/// Service configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// JSON snapshot file. Without it sessions live in memory only.
    pub data_file: Option<PathBuf>,
    /// Sessions untouched for this long are dropped.
    pub inactivity_timeout_hours: u64,
    pub pairing: PairingConfig,
    pub costs: CostRates,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_file: None,
            inactivity_timeout_hours: 12,
            pairing: PairingConfig::default(),
            costs: CostRates::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// File named by `BADMINTON_CONFIG`, else `badminton.toml` if present, else defaults;
    /// then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `HOST` / `PORT` / `DATA_FILE` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("PORT is not a port number: {port}")))?;
        }
        if let Some(path) = lookup("DATA_FILE") {
            self.data_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.costs.validate()?;
        if self.pairing.repeat_limit == 0 || self.pairing.light_game_limit == 0 {
            return Err(ConfigError::ValidationError(
                "repeat_limit and light_game_limit must be at least 1".to_string(),
            ));
        }
        if !(0..=MAX_SWAP_WAIT_TOLERANCE_MINUTES).contains(&self.pairing.swap_wait_tolerance_minutes) {
            return Err(ConfigError::ValidationError(format!(
                "swap_wait_tolerance_minutes must be between 0 and {MAX_SWAP_WAIT_TOLERANCE_MINUTES}"
            )));
        }
        if self.pairing.exhaustive_max_players > MAX_EXHAUSTIVE_PLAYERS {
            return Err(ConfigError::ValidationError(format!(
                "exhaustive_max_players must be at most {MAX_EXHAUSTIVE_PLAYERS}"
            )));
        }
        Ok(())
    }
}
