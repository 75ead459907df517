//! Configuration with validation and defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CasinoConfig {
    pub api: ApiConfig,
    pub token: TokenConfig,
    pub limits: LimitsConfig,
    pub pointer: PointerSettings,
}

/// HTTP surface settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Demo token ledger settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub default_symbol: String,
    /// Supply minted to the CEO wallet on startup.
    pub initial_supply: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_symbol: "PLAY".to_string(),
            initial_supply: 100_000_000,
        }
    }
}

/// Betting limits and payout tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum single bet configured for each game at startup.
    pub default_maximum_bet: u64,
    /// Aggregate amount allowed on one roulette square per play.
    pub roulette_square_limit: u64,
    /// Slots payout factors for symbols 1..=4.
    pub slots_factors: [u64; 4],
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_maximum_bet: 1_000,
            roulette_square_limit: crate::games::roulette::DEFAULT_SQUARE_LIMIT,
            slots_factors: crate::games::slots::DEFAULT_FACTORS,
        }
    }
}

/// Loyalty point settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerSettings {
    /// Wagered base units per point.
    pub ratio: u64,
    pub affiliate_percent: u64,
    pub collecting: bool,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            ratio: 100,
            affiliate_percent: crate::pointer::DEFAULT_AFFILIATE_PERCENT,
            collecting: true,
        }
    }
}

impl CasinoConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        let config: CasinoConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.default_symbol.is_empty() {
            return Err(ConfigError::InvalidValue(
                "token.default_symbol must not be empty".to_string(),
            ));
        }
        if self.limits.roulette_square_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "limits.roulette_square_limit must be > 0".to_string(),
            ));
        }
        if self.limits.slots_factors.iter().any(|f| *f == 0) {
            return Err(ConfigError::InvalidValue(
                "limits.slots_factors must all be > 0".to_string(),
            ));
        }
        if self.pointer.ratio == 0 {
            return Err(ConfigError::InvalidValue(
                "pointer.ratio must be > 0".to_string(),
            ));
        }
        if self.pointer.affiliate_percent > 100 {
            return Err(ConfigError::InvalidValue(
                "pointer.affiliate_percent must be <= 100".to_string(),
            ));
        }
        Ok(())
    }
}
