//! Cost and reward generation for gift boxes.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::{
    COST_COMMON, COST_EPIC, COST_LEGENDARY, COST_RARE, REWARD_COMMON, REWARD_EPIC,
    REWARD_LEGENDARY, REWARD_RARE,
};
use crate::effects::EffectEngine;
use crate::money::Cents;
use crate::rarity::{Rarity, RarityCfg};

/// Closed interval a tier's value is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRange {
    pub min: f64,
    pub max: f64,
}

impl TierRange {
    #[must_use]
    pub const fn new(bounds: (f64, f64)) -> Self {
        Self {
            min: bounds.0,
            max: bounds.1,
        }
    }

    /// Uniform draw in `[min, max)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let unit: f64 = rng.r#gen();
        unit.mul_add(self.max - self.min, self.min)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min < 0.0 {
            return Err(ConfigError::MinViolation {
                field,
                min: 0.0,
                value: self.min,
            });
        }
        if self.min > self.max {
            return Err(ConfigError::RangeInverted {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// One range per rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRanges {
    pub common: TierRange,
    pub rare: TierRange,
    pub epic: TierRange,
    pub legendary: TierRange,
}

impl TierRanges {
    /// Token cost ranges shipped with the game.
    #[must_use]
    pub const fn default_costs() -> Self {
        Self {
            common: TierRange::new(COST_COMMON),
            rare: TierRange::new(COST_RARE),
            epic: TierRange::new(COST_EPIC),
            legendary: TierRange::new(COST_LEGENDARY),
        }
    }

    /// Reward multiplier ranges shipped with the game.
    #[must_use]
    pub const fn default_rewards() -> Self {
        Self {
            common: TierRange::new(REWARD_COMMON),
            rare: TierRange::new(REWARD_RARE),
            epic: TierRange::new(REWARD_EPIC),
            legendary: TierRange::new(REWARD_LEGENDARY),
        }
    }

    #[must_use]
    pub const fn get(&self, rarity: Rarity) -> TierRange {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }

    fn validate(&self, prefix: &'static [&'static str; 4]) -> Result<(), ConfigError> {
        for (rarity, field) in Rarity::ALL.into_iter().zip(prefix.iter()) {
            self.get(rarity).validate(field)?;
        }
        Ok(())
    }
}

/// Cost and reward tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyCfg {
    #[serde(default = "TierRanges::default_costs")]
    pub cost: TierRanges,
    #[serde(default = "TierRanges::default_rewards")]
    pub reward: TierRanges,
}

impl Default for EconomyCfg {
    fn default() -> Self {
        Self {
            cost: TierRanges::default_costs(),
            reward: TierRanges::default_rewards(),
        }
    }
}

impl EconomyCfg {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.cost.validate(&[
            "cost.common",
            "cost.rare",
            "cost.epic",
            "cost.legendary",
        ])?;
        self.reward.validate(&[
            "reward.common",
            "reward.rare",
            "reward.epic",
            "reward.legendary",
        ])
    }

    /// Draw a cost for a tier, rounded to the cent.
    pub fn generate_cost<R: Rng + ?Sized>(&self, rarity: Rarity, rng: &mut R) -> Cents {
        Cents::from_units(self.cost.get(rarity).sample(rng))
    }

    /// Draw a reward for a box of `cost` and `rarity`, rounded to the cent.
    pub fn generate_reward<R: Rng + ?Sized>(
        &self,
        cost: Cents,
        rarity: Rarity,
        rng: &mut R,
    ) -> Cents {
        cost.scale(self.reward.get(rarity).sample(rng))
    }

    /// Smallest and largest reward a box can pay out, after cent rounding.
    #[must_use]
    pub fn reward_bounds(&self, cost: Cents, rarity: Rarity) -> (Cents, Cents) {
        let range = self.reward.get(rarity);
        (cost.scale(range.min), cost.scale(range.max))
    }
}

/// Outcome of a rarity draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityDraw {
    pub rarity: Rarity,
    /// Whether a boost charge was spent on this draw.
    pub boosted: bool,
}

/// Draw a rarity, spending one pending boost charge if there is one.
pub fn draw_rarity<R: Rng + ?Sized>(
    cfg: &RarityCfg,
    effects: &mut EffectEngine,
    rng: &mut R,
) -> RarityDraw {
    let boosted = effects.consume_rarity_boost();
    RarityDraw {
        rarity: cfg.draw(rng, boosted),
        boosted,
    }
}

/// Result of opening one gift box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboxOutcome {
    pub box_id: u64,
    pub rarity: Rarity,
    pub cost: Cents,
    pub reward: Cents,
    /// `reward - cost`; negative when the box paid out less than it cost.
    pub profit: Cents,
    /// Coins credited to the purse (reward scaled by any active multiplier).
    pub coins: Cents,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn costs_stay_inside_tier_ranges() {
        let cfg = EconomyCfg::default();
        let mut rng = SmallRng::seed_from_u64(0xC057);
        for rarity in Rarity::ALL {
            let range = cfg.cost.get(rarity);
            for _ in 0..500 {
                let cost = cfg.generate_cost(rarity, &mut rng);
                assert!(cost >= Cents::from_units(range.min), "{rarity} cost {cost}");
                assert!(cost <= Cents::from_units(range.max), "{rarity} cost {cost}");
            }
        }
    }

    #[test]
    fn rewards_stay_inside_multiplier_bounds() {
        let cfg = EconomyCfg::default();
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        for rarity in Rarity::ALL {
            for _ in 0..200 {
                let cost = cfg.generate_cost(rarity, &mut rng);
                let reward = cfg.generate_reward(cost, rarity, &mut rng);
                let (low, high) = cfg.reward_bounds(cost, rarity);
                assert!(
                    low <= reward && reward <= high,
                    "{rarity}: {reward} vs {low}..{high}"
                );
            }
        }
    }

    #[test]
    fn legendary_thirty_pays_between_45_and_300() {
        let cfg = EconomyCfg::default();
        let cost = Cents::from_whole(30);
        let (low, high) = cfg.reward_bounds(cost, Rarity::Legendary);
        assert_eq!(low, Cents(4_500));
        assert_eq!(high, Cents(30_000));
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            let reward = cfg.generate_reward(cost, Rarity::Legendary, &mut rng);
            assert!((Cents(4_500)..=Cents(30_000)).contains(&reward));
        }
    }

    #[test]
    fn zero_cost_pays_zero() {
        let cfg = EconomyCfg::default();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            cfg.generate_reward(Cents::ZERO, Rarity::Epic, &mut rng),
            Cents::ZERO
        );
    }

    #[test]
    fn draw_rarity_spends_exactly_one_charge() {
        let cfg = RarityCfg::default();
        let mut effects = EffectEngine::default();
        effects.add_boost_charges(2);
        let mut rng = SmallRng::seed_from_u64(11);
        let first = draw_rarity(&cfg, &mut effects, &mut rng);
        assert!(first.boosted);
        assert_eq!(effects.boost_charges(), 1);
        let _ = draw_rarity(&cfg, &mut effects, &mut rng);
        let third = draw_rarity(&cfg, &mut effects, &mut rng);
        assert!(!third.boosted);
        assert_eq!(effects.boost_charges(), 0);
    }

    #[test]
    fn boosted_draw_uses_boosted_table() {
        let cfg = RarityCfg::default();
        let mut boosted_effects = EffectEngine::default();
        boosted_effects.add_boost_charges(1);
        let mut plain_effects = EffectEngine::default();
        for seed in 0..64 {
            let mut a = SmallRng::seed_from_u64(seed);
            let mut b = SmallRng::seed_from_u64(seed);
            let mut c = SmallRng::seed_from_u64(seed);
            let mut effects = boosted_effects.clone();
            let drawn = draw_rarity(&cfg, &mut effects, &mut a);
            assert_eq!(drawn.rarity, cfg.draw(&mut b, true));
            let plain = draw_rarity(&cfg, &mut plain_effects, &mut c);
            assert!(!plain.boosted);
        }
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut cfg = EconomyCfg::default();
        cfg.reward.epic = TierRange { min: 5.0, max: 1.0 };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeInverted {
                field: "reward.epic",
                ..
            })
        ));
    }
}
