//! Gift boxes riding the conveyor belt.
//!
//! Positions are abstracted to "belt time": each box accumulates the time it
//! has spent moving (scaled by the speed modifier) and falls off once that
//! reaches the belt length.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::ConfigError;
use crate::constants::{BELT_TRAVEL_MS, MAX_BOXES_ON_BELT, SPAWN_INTERVAL_MS};
use crate::effects::Modifiers;
use crate::money::Cents;
use crate::numbers::{f64_to_u64_saturating, u64_to_f64};
use crate::rarity::Rarity;

/// Spawn cadence and belt length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConveyorCfg {
    #[serde(default = "ConveyorCfg::default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,
    #[serde(default = "ConveyorCfg::default_belt_travel_ms")]
    pub belt_travel_ms: u64,
    #[serde(default = "ConveyorCfg::default_max_boxes")]
    pub max_boxes: usize,
}

impl ConveyorCfg {
    const fn default_spawn_interval_ms() -> u64 {
        SPAWN_INTERVAL_MS
    }

    const fn default_belt_travel_ms() -> u64 {
        BELT_TRAVEL_MS
    }

    const fn default_max_boxes() -> usize {
        MAX_BOXES_ON_BELT
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "conveyor.spawn_interval_ms",
            });
        }
        if self.belt_travel_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "conveyor.belt_travel_ms",
            });
        }
        if self.max_boxes == 0 {
            return Err(ConfigError::MinViolation {
                field: "conveyor.max_boxes",
                min: 1.0,
                value: 0.0,
            });
        }
        Ok(())
    }
}

impl Default for ConveyorCfg {
    fn default() -> Self {
        Self {
            spawn_interval_ms: Self::default_spawn_interval_ms(),
            belt_travel_ms: Self::default_belt_travel_ms(),
            max_boxes: Self::default_max_boxes(),
        }
    }
}

/// A mystery box on the belt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftBox {
    pub id: u64,
    pub rarity: Rarity,
    pub cost: Cents,
    /// Belt time travelled so far.
    pub travelled_ms: u64,
}

/// What happened on the belt during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConveyorTick {
    pub spawned: Option<GiftBox>,
    pub fell_off: SmallVec<[GiftBox; 2]>,
}

/// Live boxes plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conveyor {
    boxes: Vec<GiftBox>,
    next_id: u64,
    last_tick_ms: Option<u64>,
    since_spawn_ms: u64,
}

impl Conveyor {
    /// Empty belt whose first box will get `next_id`. The first unfrozen tick spawns.
    #[must_use]
    pub const fn new(next_id: u64, cfg: &ConveyorCfg) -> Self {
        Self {
            boxes: Vec::new(),
            next_id,
            last_tick_ms: None,
            since_spawn_ms: cfg.spawn_interval_ms,
        }
    }

    /// Advance the belt to `now_ms`.
    ///
    /// While frozen nothing moves and nothing spawns. Otherwise boxes travel
    /// by the elapsed time scaled by the speed modifier, boxes past the end
    /// fall off, and `spawn` is called for a new box's rarity and cost when the
    /// spawn interval has passed and the belt has room.
    pub fn tick(
        &mut self,
        now_ms: u64,
        modifiers: &Modifiers,
        cfg: &ConveyorCfg,
        spawn: impl FnOnce() -> (Rarity, Cents),
    ) -> ConveyorTick {
        let elapsed = self
            .last_tick_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_tick_ms = Some(now_ms);

        let mut outcome = ConveyorTick::default();
        if modifiers.frozen {
            return outcome;
        }

        let travel = f64_to_u64_saturating(u64_to_f64(elapsed) * modifiers.speed_multiplier);
        for gift in &mut self.boxes {
            gift.travelled_ms = gift.travelled_ms.saturating_add(travel);
        }
        let belt = cfg.belt_travel_ms;
        outcome
            .fell_off
            .extend(self.boxes.iter().filter(|b| b.travelled_ms >= belt).copied());
        self.boxes.retain(|b| b.travelled_ms < belt);

        self.since_spawn_ms = self.since_spawn_ms.saturating_add(elapsed);
        if self.since_spawn_ms >= cfg.spawn_interval_ms && self.boxes.len() < cfg.max_boxes {
            let (rarity, cost) = spawn();
            let gift = GiftBox {
                id: self.next_id,
                rarity,
                cost,
                travelled_ms: 0,
            };
            self.next_id = self.next_id.saturating_add(1);
            self.since_spawn_ms = 0;
            self.boxes.push(gift);
            log::debug!("spawned box {} ({rarity}, cost {cost})", gift.id);
            outcome.spawned = Some(gift);
        }
        outcome
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&GiftBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    /// Remove a box for unboxing.
    pub fn take(&mut self, id: u64) -> Option<GiftBox> {
        let index = self.boxes.iter().position(|b| b.id == id)?;
        Some(self.boxes.remove(index))
    }

    #[must_use]
    pub fn boxes(&self) -> &[GiftBox] {
        &self.boxes
    }

    /// Id the next spawned box will receive.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common_box() -> (Rarity, Cents) {
        (Rarity::Common, Cents(250))
    }

    #[test]
    fn first_tick_spawns_and_ids_increase() {
        let cfg = ConveyorCfg::default();
        let mut belt = Conveyor::new(0, &cfg);
        let modifiers = Modifiers::default();
        let first = belt.tick(0, &modifiers, &cfg, common_box);
        assert_eq!(first.spawned.map(|b| b.id), Some(0));
        assert!(belt.tick(1_000, &modifiers, &cfg, common_box).spawned.is_none());
        let second = belt.tick(1_200, &modifiers, &cfg, common_box);
        assert_eq!(second.spawned.map(|b| b.id), Some(1));
        assert_eq!(belt.next_id(), 2);
    }

    #[test]
    fn freeze_pauses_travel_and_spawning() {
        let cfg = ConveyorCfg::default();
        let mut belt = Conveyor::new(0, &cfg);
        let _ = belt.tick(0, &Modifiers::default(), &cfg, common_box);
        let frozen = Modifiers {
            frozen: true,
            ..Modifiers::default()
        };
        let outcome = belt.tick(5_000, &frozen, &cfg, common_box);
        assert!(outcome.spawned.is_none());
        assert_eq!(belt.boxes()[0].travelled_ms, 0);
    }

    #[test]
    fn boxes_fall_off_after_belt_length() {
        let cfg = ConveyorCfg {
            spawn_interval_ms: 100_000,
            ..ConveyorCfg::default()
        };
        let mut belt = Conveyor::new(7, &cfg);
        let modifiers = Modifiers::default();
        let _ = belt.tick(0, &modifiers, &cfg, common_box);
        let _ = belt.tick(7_999, &modifiers, &cfg, common_box);
        assert_eq!(belt.boxes().len(), 1);
        let outcome = belt.tick(8_000, &modifiers, &cfg, common_box);
        assert_eq!(outcome.fell_off.len(), 1);
        assert_eq!(outcome.fell_off[0].id, 7);
        assert!(belt.is_empty());
    }

    #[test]
    fn slow_mo_scales_travel() {
        let cfg = ConveyorCfg {
            spawn_interval_ms: 100_000,
            ..ConveyorCfg::default()
        };
        let mut belt = Conveyor::new(0, &cfg);
        let slow = Modifiers {
            speed_multiplier: 0.3,
            ..Modifiers::default()
        };
        let _ = belt.tick(0, &slow, &cfg, common_box);
        let _ = belt.tick(1_000, &slow, &cfg, common_box);
        assert_eq!(belt.boxes()[0].travelled_ms, 300);
    }

    #[test]
    fn belt_capacity_blocks_spawns() {
        let cfg = ConveyorCfg {
            spawn_interval_ms: 10,
            belt_travel_ms: 1_000_000,
            max_boxes: 2,
        };
        let mut belt = Conveyor::new(0, &cfg);
        let modifiers = Modifiers::default();
        for step in 0..10 {
            let _ = belt.tick(step * 10, &modifiers, &cfg, common_box);
        }
        assert_eq!(belt.boxes().len(), 2);
    }

    #[test]
    fn take_removes_box_once() {
        let cfg = ConveyorCfg::default();
        let mut belt = Conveyor::new(0, &cfg);
        let _ = belt.tick(0, &Modifiers::default(), &cfg, common_box);
        assert!(belt.get(0).is_some());
        assert_eq!(belt.take(0).map(|b| b.cost), Some(Cents(250)));
        assert!(belt.take(0).is_none());
    }
}
