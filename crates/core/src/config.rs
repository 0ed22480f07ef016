//! Engine configuration
//!
//! Values come from built-in defaults, an optional TOML file and
//! `CITYMINE_*` environment variables, in that order of precedence.

use anyhow::{Context, Result};
use citymine_economics::{EconomicsError, ScheduleParams};
use citymine_types::Principal;
use config::{Config, Environment, File as ConfigFile, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Blocks between the threshold-th registration and activation. Fixed so
/// stackers always get the same head start.
pub const ACTIVATION_DELAY: u64 = 150;

/// Default number of registrations that activates the engine.
pub const DEFAULT_ACTIVATION_THRESHOLD: u64 = 20;
/// Blocks per reward cycle.
pub const REWARD_CYCLE_LENGTH: u64 = 2_100;
/// Blocks a mining reward must wait before it can be claimed.
pub const TOKEN_REWARD_MATURITY: u64 = 100;
/// Percentage of every commitment sent to the city wallet.
pub const SPLIT_CITY_PCT: u64 = 30;
/// Longest lock period, in reward cycles.
pub const MAX_REWARD_CYCLES: u64 = 32;
/// Upper bound accepted for `max_lock_cycles`. Each stake writes one record
/// per locked cycle.
pub const LOCK_CYCLES_CEILING: u64 = 1_024;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("activation_threshold must be positive")]
    ZeroThreshold,

    #[error("reward_cycle_length must be positive")]
    ZeroCycleLength,

    #[error("maturity_window must be at least one block")]
    ZeroMaturity,

    #[error("city_split_pct must be between 0 and 100, got {0}")]
    SplitOutOfRange(u64),

    #[error("max_lock_cycles must be positive")]
    ZeroLockCycles,

    #[error("max_lock_cycles must be at most 1024, got {0}")]
    LockCyclesTooLarge(u64),

    #[error("city_wallet and stacking_pool must be different principals")]
    SharedWallet,

    #[error("invalid issuance schedule: {0}")]
    Schedule(#[from] EconomicsError),
}

/// Tunable engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registrations required before activation is scheduled
    pub activation_threshold: u64,
    /// Blocks per reward cycle
    pub reward_cycle_length: u64,
    /// Blocks between mining and claiming
    pub maturity_window: u64,
    /// Share of each commitment sent to the city wallet (percent)
    pub city_split_pct: u64,
    /// Longest allowed lock period in cycles
    pub max_lock_cycles: u64,
    /// Beneficiary of the city split
    pub city_wallet: Principal,
    /// Custodian of stacked tokens and the stackers' share of commitments
    pub stacking_pool: Principal,
    /// Issuance schedule
    pub schedule: ScheduleParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activation_threshold: DEFAULT_ACTIVATION_THRESHOLD,
            reward_cycle_length: REWARD_CYCLE_LENGTH,
            maturity_window: TOKEN_REWARD_MATURITY,
            city_split_pct: SPLIT_CITY_PCT,
            max_lock_cycles: MAX_REWARD_CYCLES,
            city_wallet: Principal::from_label("city-wallet"),
            stacking_pool: Principal::from_label("stacking-pool"),
            schedule: ScheduleParams::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional TOML file plus `CITYMINE_*`
    /// environment variables, e.g. `CITYMINE_ACTIVATION_THRESHOLD` or
    /// `CITYMINE_SCHEDULE__BONUS_REWARD` for nested keys.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`EngineConfig::load`], reading overrides from `env` instead of
    /// the process environment when it is given.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Configuration file {} not found", path.display());
            }
            builder = builder.add_source(ConfigFile::new(
                &path.to_string_lossy(),
                FileFormat::Toml,
            ));
        }

        builder = builder.add_source(
            Environment::with_prefix("CITYMINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: EngineConfig = builder
            .build()
            .context("failed to assemble engine configuration")?
            .try_deserialize()
            .context("failed to parse engine configuration")?;

        config.validate().context("invalid engine configuration")?;
        Ok(config)
    }

    /// Reject parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.activation_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.reward_cycle_length == 0 {
            return Err(ConfigError::ZeroCycleLength);
        }
        if self.maturity_window == 0 {
            return Err(ConfigError::ZeroMaturity);
        }
        if self.city_split_pct > 100 {
            return Err(ConfigError::SplitOutOfRange(self.city_split_pct));
        }
        if self.max_lock_cycles == 0 {
            return Err(ConfigError::ZeroLockCycles);
        }
        if self.max_lock_cycles > LOCK_CYCLES_CEILING {
            return Err(ConfigError::LockCyclesTooLarge(self.max_lock_cycles));
        }
        if self.city_wallet == self.stacking_pool {
            return Err(ConfigError::SharedWallet);
        }
        self.schedule.validate()?;
        Ok(())
    }
}
