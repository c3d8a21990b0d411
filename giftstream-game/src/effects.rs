//! Power-ups, the player's power-up inventory, and the timed effects they grant.
//!
//! Timed effects are polled: the host calls [`EffectEngine::tick`] with the
//! current time and anything whose expiry has passed is dropped. There are no
//! callbacks or timers here.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::ConfigError;
use crate::constants::{
    FREEZE_DURATION_MS, GOLD_RUSH_DURATION_MS, GOLD_RUSH_MULTIPLIER, MAGNET_DURATION_MS,
    RARITY_BOOST_CHARGES, SLOW_MO_DURATION_MS, SLOW_MO_SPEED_MULTIPLIER,
};

/// Consumable sold in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUp {
    SlowMo,
    X2Rarity,
    Freeze,
    Magnet,
    GoldRush,
}

impl PowerUp {
    pub const ALL: [Self; 5] = [
        Self::SlowMo,
        Self::X2Rarity,
        Self::Freeze,
        Self::Magnet,
        Self::GoldRush,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SlowMo => "slowMo",
            Self::X2Rarity => "x2Rarity",
            Self::Freeze => "freeze",
            Self::Magnet => "magnet",
            Self::GoldRush => "goldRush",
        }
    }

    /// Parse a catalog id such as `"goldRush"`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Timed effect granted on use; `None` for the counted rarity boost.
    #[must_use]
    pub const fn effect_kind(self) -> Option<EffectKind> {
        match self {
            Self::SlowMo => Some(EffectKind::SpeedBoost),
            Self::Freeze => Some(EffectKind::Freeze),
            Self::GoldRush => Some(EffectKind::RewardMultiplier),
            Self::Magnet => Some(EffectKind::Magnet),
            Self::X2Rarity => None,
        }
    }
}

impl fmt::Display for PowerUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Timed modifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Conveyor speed change (slow-mo).
    SpeedBoost,
    /// Conveyor fully paused.
    Freeze,
    /// Coin credits scaled up.
    RewardMultiplier,
    /// Cosmetic pull of boxes toward the cursor; no economy impact.
    Magnet,
}

/// An active timed effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub expires_at_ms: u64,
}

impl ActiveEffect {
    /// Active strictly before its expiry instant.
    #[must_use]
    pub const fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// Durations and strengths of each power-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectCfg {
    #[serde(default = "EffectCfg::default_slow_mo_ms")]
    pub slow_mo_ms: u64,
    #[serde(default = "EffectCfg::default_slow_mo_speed")]
    pub slow_mo_speed: f64,
    #[serde(default = "EffectCfg::default_freeze_ms")]
    pub freeze_ms: u64,
    #[serde(default = "EffectCfg::default_gold_rush_ms")]
    pub gold_rush_ms: u64,
    #[serde(default = "EffectCfg::default_gold_rush_multiplier")]
    pub gold_rush_multiplier: f64,
    #[serde(default = "EffectCfg::default_magnet_ms")]
    pub magnet_ms: u64,
    #[serde(default = "EffectCfg::default_rarity_boost_charges")]
    pub rarity_boost_charges: u32,
}

impl EffectCfg {
    const fn default_slow_mo_ms() -> u64 {
        SLOW_MO_DURATION_MS
    }

    const fn default_slow_mo_speed() -> f64 {
        SLOW_MO_SPEED_MULTIPLIER
    }

    const fn default_freeze_ms() -> u64 {
        FREEZE_DURATION_MS
    }

    const fn default_gold_rush_ms() -> u64 {
        GOLD_RUSH_DURATION_MS
    }

    const fn default_gold_rush_multiplier() -> f64 {
        GOLD_RUSH_MULTIPLIER
    }

    const fn default_magnet_ms() -> u64 {
        MAGNET_DURATION_MS
    }

    const fn default_rarity_boost_charges() -> u32 {
        RARITY_BOOST_CHARGES
    }

    /// Duration of a timed effect kind.
    #[must_use]
    pub const fn duration_ms(&self, kind: EffectKind) -> u64 {
        match kind {
            EffectKind::SpeedBoost => self.slow_mo_ms,
            EffectKind::Freeze => self.freeze_ms,
            EffectKind::RewardMultiplier => self.gold_rush_ms,
            EffectKind::Magnet => self.magnet_ms,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.slow_mo_speed > 0.0 && self.slow_mo_speed <= 1.0) {
            return Err(ConfigError::RangeViolation {
                field: "effects.slow_mo_speed",
                min: 0.0,
                max: 1.0,
                value: self.slow_mo_speed,
            });
        }
        if !(self.gold_rush_multiplier >= 1.0 && self.gold_rush_multiplier.is_finite()) {
            return Err(ConfigError::MinViolation {
                field: "effects.gold_rush_multiplier",
                min: 1.0,
                value: self.gold_rush_multiplier,
            });
        }
        let durations = [
            ("effects.slow_mo_ms", self.slow_mo_ms),
            ("effects.freeze_ms", self.freeze_ms),
            ("effects.gold_rush_ms", self.gold_rush_ms),
            ("effects.magnet_ms", self.magnet_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        Ok(())
    }
}

impl Default for EffectCfg {
    fn default() -> Self {
        Self {
            slow_mo_ms: Self::default_slow_mo_ms(),
            slow_mo_speed: Self::default_slow_mo_speed(),
            freeze_ms: Self::default_freeze_ms(),
            gold_rush_ms: Self::default_gold_rush_ms(),
            gold_rush_multiplier: Self::default_gold_rush_multiplier(),
            magnet_ms: Self::default_magnet_ms(),
            rarity_boost_charges: Self::default_rarity_boost_charges(),
        }
    }
}

/// Combined view of every active modifier at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    pub speed_multiplier: f64,
    pub frozen: bool,
    pub reward_multiplier: f64,
    pub magnet: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            frozen: false,
            reward_multiplier: 1.0,
            magnet: false,
        }
    }
}

/// Power-up counts owned by the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    counts: BTreeMap<PowerUp, u32>,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one power-up and return the new count.
    pub fn add(&mut self, power_up: PowerUp) -> u32 {
        let count = self.counts.entry(power_up).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    #[must_use]
    pub fn count(&self, power_up: PowerUp) -> u32 {
        self.counts.get(&power_up).copied().unwrap_or(0)
    }

    /// Remove one power-up. Returns false, leaving the inventory untouched, when none are held.
    pub fn take(&mut self, power_up: PowerUp) -> bool {
        match self.counts.get_mut(&power_up) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Power-ups with a positive count, in catalog order.
    pub fn available(&self) -> impl Iterator<Item = (PowerUp, u32)> + '_ {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(power_up, count)| (*power_up, *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.available().next().is_none()
    }
}

/// Kinds that expired during one tick.
pub type ExpiredEffects = SmallVec<[EffectKind; 4]>;

/// Tracks active timed effects and pending rarity-boost charges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectEngine {
    #[serde(default)]
    active: SmallVec<[ActiveEffect; 4]>,
    #[serde(default)]
    boost_charges: u32,
}

impl EffectEngine {
    /// Start (or restart) a timed effect. A repeat activation replaces the
    /// previous expiry with `now + duration`; durations never stack.
    pub fn activate(&mut self, kind: EffectKind, now_ms: u64, cfg: &EffectCfg) -> ActiveEffect {
        let effect = ActiveEffect {
            kind,
            expires_at_ms: now_ms.saturating_add(cfg.duration_ms(kind)),
        };
        self.active.retain(|existing| existing.kind != kind);
        self.active.push(effect);
        log::debug!("effect {kind:?} active until {}", effect.expires_at_ms);
        effect
    }

    /// Consume one power-up from `inventory` and apply it.
    ///
    /// Returns false with no state change when the inventory holds none.
    pub fn use_power_up(
        &mut self,
        inventory: &mut Inventory,
        power_up: PowerUp,
        now_ms: u64,
        cfg: &EffectCfg,
    ) -> bool {
        if !inventory.take(power_up) {
            return false;
        }
        match power_up.effect_kind() {
            Some(kind) => {
                self.activate(kind, now_ms, cfg);
            }
            None => self.add_boost_charges(cfg.rarity_boost_charges),
        }
        true
    }

    pub fn add_boost_charges(&mut self, charges: u32) {
        self.boost_charges = self.boost_charges.saturating_add(charges);
    }

    /// Spend one rarity-boost charge if any are pending.
    pub fn consume_rarity_boost(&mut self) -> bool {
        if self.boost_charges == 0 {
            return false;
        }
        self.boost_charges -= 1;
        true
    }

    #[must_use]
    pub const fn boost_charges(&self) -> u32 {
        self.boost_charges
    }

    #[must_use]
    pub fn is_active(&self, kind: EffectKind, now_ms: u64) -> bool {
        self.active
            .iter()
            .any(|effect| effect.kind == kind && effect.is_active(now_ms))
    }

    /// Milliseconds left on an effect, or `None` when it is not active.
    #[must_use]
    pub fn remaining_ms(&self, kind: EffectKind, now_ms: u64) -> Option<u64> {
        self.active
            .iter()
            .find(|effect| effect.kind == kind && effect.is_active(now_ms))
            .map(|effect| effect.expires_at_ms - now_ms)
    }

    /// Effects recorded as active, including any not yet pruned by `tick`.
    #[must_use]
    pub fn effects(&self) -> &[ActiveEffect] {
        &self.active
    }

    /// Drop every effect whose expiry has passed and report which kinds ended.
    pub fn tick(&mut self, now_ms: u64) -> ExpiredEffects {
        let expired: ExpiredEffects = self
            .active
            .iter()
            .filter(|effect| !effect.is_active(now_ms))
            .map(|effect| effect.kind)
            .collect();
        if !expired.is_empty() {
            self.active.retain(|effect| effect.is_active(now_ms));
            log::debug!("effects expired at {now_ms}: {expired:?}");
        }
        expired
    }

    /// Modifiers in force at `now_ms`.
    #[must_use]
    pub fn modifiers(&self, now_ms: u64, cfg: &EffectCfg) -> Modifiers {
        let mut modifiers = Modifiers::default();
        for effect in self.active.iter().filter(|e| e.is_active(now_ms)) {
            match effect.kind {
                EffectKind::SpeedBoost => modifiers.speed_multiplier = cfg.slow_mo_speed,
                EffectKind::Freeze => modifiers.frozen = true,
                EffectKind::RewardMultiplier => {
                    modifiers.reward_multiplier = cfg.gold_rush_multiplier;
                }
                EffectKind::Magnet => modifiers.magnet = true,
            }
        }
        modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_is_active_until_expiry() {
        let cfg = EffectCfg::default();
        let mut engine = EffectEngine::default();
        let t0 = 1_000;
        engine.activate(EffectKind::Freeze, t0, &cfg);
        assert!(engine.is_active(EffectKind::Freeze, t0 + 4_999));
        assert!(!engine.is_active(EffectKind::Freeze, t0 + 5_000));
        assert!(!engine.is_active(EffectKind::Freeze, t0 + 5_001));
        assert_eq!(engine.remaining_ms(EffectKind::Freeze, t0 + 4_000), Some(1_000));
    }

    #[test]
    fn tick_prunes_and_reports_expired() {
        let cfg = EffectCfg::default();
        let mut engine = EffectEngine::default();
        engine.activate(EffectKind::Freeze, 0, &cfg);
        engine.activate(EffectKind::RewardMultiplier, 0, &cfg);
        assert!(engine.tick(4_999).is_empty());
        let expired = engine.tick(5_001);
        assert_eq!(expired.as_slice(), &[EffectKind::Freeze]);
        assert_eq!(engine.effects().len(), 1);
        assert!(engine.is_active(EffectKind::RewardMultiplier, 5_001));
    }

    #[test]
    fn repeat_activation_overrides_instead_of_stacking() {
        let cfg = EffectCfg::default();
        let mut engine = EffectEngine::default();
        engine.activate(EffectKind::Freeze, 0, &cfg);
        engine.activate(EffectKind::Freeze, 3_000, &cfg);
        assert_eq!(engine.effects().len(), 1);
        assert_eq!(engine.effects()[0].expires_at_ms, 8_000);
        assert!(engine.is_active(EffectKind::Freeze, 7_999));
        assert!(!engine.is_active(EffectKind::Freeze, 8_000));
    }

    #[test]
    fn use_power_up_requires_inventory() {
        let cfg = EffectCfg::default();
        let mut engine = EffectEngine::default();
        let mut inventory = Inventory::new();
        assert!(!engine.use_power_up(&mut inventory, PowerUp::SlowMo, 0, &cfg));
        assert!(engine.effects().is_empty());

        inventory.add(PowerUp::SlowMo);
        assert!(engine.use_power_up(&mut inventory, PowerUp::SlowMo, 0, &cfg));
        assert_eq!(inventory.count(PowerUp::SlowMo), 0);
        assert!(engine.is_active(EffectKind::SpeedBoost, 9_999));
        assert!(!engine.use_power_up(&mut inventory, PowerUp::SlowMo, 10, &cfg));
    }

    #[test]
    fn rarity_power_up_adds_charges_not_timer() {
        let cfg = EffectCfg::default();
        let mut engine = EffectEngine::default();
        let mut inventory = Inventory::new();
        inventory.add(PowerUp::X2Rarity);
        inventory.add(PowerUp::X2Rarity);
        assert!(engine.use_power_up(&mut inventory, PowerUp::X2Rarity, 0, &cfg));
        assert!(engine.use_power_up(&mut inventory, PowerUp::X2Rarity, 0, &cfg));
        assert_eq!(engine.boost_charges(), 6);
        assert!(engine.effects().is_empty());
        assert!(engine.consume_rarity_boost());
        assert_eq!(engine.boost_charges(), 5);
    }

    #[test]
    fn modifiers_combine_active_effects() {
        let cfg = EffectCfg::default();
        let mut engine = EffectEngine::default();
        assert_eq!(engine.modifiers(0, &cfg), Modifiers::default());
        engine.activate(EffectKind::SpeedBoost, 0, &cfg);
        engine.activate(EffectKind::RewardMultiplier, 0, &cfg);
        engine.activate(EffectKind::Magnet, 0, &cfg);
        let modifiers = engine.modifiers(1_000, &cfg);
        assert!((modifiers.speed_multiplier - 0.3).abs() < f64::EPSILON);
        assert!((modifiers.reward_multiplier - 2.0).abs() < f64::EPSILON);
        assert!(modifiers.magnet);
        assert!(!modifiers.frozen);
        let later = engine.modifiers(20_000, &cfg);
        assert!((later.speed_multiplier - 1.0).abs() < f64::EPSILON);
        assert!((later.reward_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inventory_reports_available_in_catalog_order() {
        let mut inventory = Inventory::new();
        inventory.add(PowerUp::GoldRush);
        inventory.add(PowerUp::SlowMo);
        inventory.add(PowerUp::SlowMo);
        assert!(inventory.take(PowerUp::GoldRush));
        let available: Vec<_> = inventory.available().collect();
        assert_eq!(available, vec![(PowerUp::SlowMo, 2)]);
        assert!(!inventory.is_empty());
    }

    #[test]
    fn power_up_keys_roundtrip_through_serde() {
        let json = serde_json::to_string(&PowerUp::X2Rarity).unwrap();
        assert_eq!(json, "\"x2Rarity\"");
        for power_up in PowerUp::ALL {
            assert_eq!(PowerUp::from_key(power_up.key()), Some(power_up));
        }
        assert_eq!(PowerUp::from_key("laser"), None);
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let cfg = EffectCfg {
            freeze_ms: 0,
            ..EffectCfg::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroDuration {
                field: "effects.freeze_ms"
            })
        ));
    }
}
