//! Rarity tiers and the weighted draw that picks one.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;
use crate::constants::{
    BASELINE_COMMON_BELOW, BASELINE_EPIC_BELOW, BASELINE_RARE_BELOW, BOOSTED_COMMON_BELOW,
    BOOSTED_EPIC_BELOW, BOOSTED_RARE_BELOW,
};

/// Gift box rarity, ordered from most to least frequent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Epic, Self::Legendary];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Cumulative draw thresholds. A draw below `common` is common, below `rare`
/// is rare, below `epic` is epic, anything else legendary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityTable {
    pub common: f64,
    pub rare: f64,
    pub epic: f64,
}

impl RarityTable {
    #[must_use]
    pub const fn baseline() -> Self {
        Self {
            common: BASELINE_COMMON_BELOW,
            rare: BASELINE_RARE_BELOW,
            epic: BASELINE_EPIC_BELOW,
        }
    }

    #[must_use]
    pub const fn boosted() -> Self {
        Self {
            common: BOOSTED_COMMON_BELOW,
            rare: BOOSTED_RARE_BELOW,
            epic: BOOSTED_EPIC_BELOW,
        }
    }

    /// Map a uniform draw in `[0, 1)` onto a tier.
    #[must_use]
    pub fn select(&self, draw: f64) -> Rarity {
        if draw < self.common {
            Rarity::Common
        } else if draw < self.rare {
            Rarity::Rare
        } else if draw < self.epic {
            Rarity::Epic
        } else {
            Rarity::Legendary
        }
    }

    /// Probability mass assigned to a tier.
    #[must_use]
    pub fn probability(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare - self.common,
            Rarity::Epic => self.epic - self.rare,
            Rarity::Legendary => 1.0 - self.epic,
        }
    }

    pub(crate) fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let ordered = 0.0 < self.common
            && self.common < self.rare
            && self.rare < self.epic
            && self.epic < 1.0;
        if !ordered {
            return Err(ConfigError::RarityThresholds {
                field,
                common: self.common,
                rare: self.rare,
                epic: self.epic,
            });
        }
        Ok(())
    }
}

/// Baseline and boosted tables used by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityCfg {
    #[serde(default = "RarityTable::baseline")]
    pub baseline: RarityTable,
    #[serde(default = "RarityTable::boosted")]
    pub boosted: RarityTable,
}

impl Default for RarityCfg {
    fn default() -> Self {
        Self {
            baseline: RarityTable::baseline(),
            boosted: RarityTable::boosted(),
        }
    }
}

impl RarityCfg {
    /// Pick the tier for a draw, using the boosted table when `boosted` is set.
    #[must_use]
    pub fn select(&self, draw: f64, boosted: bool) -> Rarity {
        if boosted {
            self.boosted.select(draw)
        } else {
            self.baseline.select(draw)
        }
    }

    /// Draw a uniform value from `rng` and select a tier.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, boosted: bool) -> Rarity {
        let draw: f64 = rng.r#gen();
        self.select(draw, boosted)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.baseline.validate("rarity.baseline")?;
        self.boosted.validate("rarity.boosted")
    }
}
