//! Aggregate tuning for the whole economy, loadable from JSON.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{STARTING_COINS, WALLET_CONNECT_GRANT};
use crate::conveyor::ConveyorCfg;
use crate::economy::EconomyCfg;
use crate::effects::EffectCfg;
use crate::money::Cents;
use crate::rarity::RarityCfg;
use crate::shop::ShopCfg;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(
        "{field} thresholds must rise strictly inside (0, 1): {common:.2}, {rare:.2}, {epic:.2}"
    )]
    RarityThresholds {
        field: &'static str,
        common: f64,
        rare: f64,
        epic: f64,
    },
    #[error("{field} minimum {min:.2} exceeds maximum {max:.2}")]
    RangeInverted {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be a positive duration")]
    ZeroDuration { field: &'static str },
    #[error("{field} must not be negative (got {value})")]
    NegativeBalance { field: &'static str, value: Cents },
    #[error("configuration JSON is malformed: {0}")]
    Json(String),
}

/// Every tunable number in the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub rarity: RarityCfg,
    #[serde(default)]
    pub economy: EconomyCfg,
    #[serde(default)]
    pub effects: EffectCfg,
    #[serde(default)]
    pub conveyor: ConveyorCfg,
    #[serde(default)]
    pub shop: ShopCfg,
    #[serde(default = "EconomyConfig::default_starting_coins")]
    pub starting_coins: Cents,
    #[serde(default = "EconomyConfig::default_wallet_grant")]
    pub wallet_grant: Cents,
}

impl EconomyConfig {
    const fn default_starting_coins() -> Cents {
        Cents::from_whole(STARTING_COINS)
    }

    const fn default_wallet_grant() -> Cents {
        Cents::from_whole(WALLET_CONNECT_GRANT)
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` for malformed input and the matching
    /// validation error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rarity.validate()?;
        self.economy.validate()?;
        self.effects.validate()?;
        self.conveyor.validate()?;
        self.shop.validate()?;
        if self.starting_coins.is_negative() {
            return Err(ConfigError::NegativeBalance {
                field: "starting_coins",
                value: self.starting_coins,
            });
        }
        if self.wallet_grant.is_negative() {
            return Err(ConfigError::NegativeBalance {
                field: "wallet_grant",
                value: self.wallet_grant,
            });
        }
        Ok(())
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            rarity: RarityCfg::default(),
            economy: EconomyCfg::default(),
            effects: EffectCfg::default(),
            conveyor: ConveyorCfg::default(),
            shop: ShopCfg::default(),
            starting_coins: Self::default_starting_coins(),
            wallet_grant: Self::default_wallet_grant(),
        }
    }
}
