//! Persisted game bucket: coins, power-ups, effects and history.
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::config::EconomyConfig;
use crate::constants::STARTING_COINS;
use crate::effects::{EffectEngine, Inventory};
use crate::ledger::Ledger;
use crate::money::Cents;
use crate::tutorial::Tutorial;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Coin purse spent in the shop.
    #[serde(default = "GameState::default_coins")]
    pub coins: Ledger,
    #[serde(default)]
    pub inventory: Inventory,
    /// Active timed effects and pending rarity-boost charges.
    #[serde(default)]
    pub effects: EffectEngine,
    #[serde(default)]
    pub collection: Collection,
    #[serde(default)]
    pub next_box_id: u64,
    #[serde(default)]
    pub tutorial: Tutorial,
}

impl GameState {
    fn default_coins() -> Ledger {
        Ledger::with_balance(Cents::from_whole(STARTING_COINS))
    }

    /// Fresh game with the configured starting coins.
    #[must_use]
    pub fn new(cfg: &EconomyConfig) -> Self {
        Self {
            coins: Ledger::with_balance(cfg.starting_coins),
            ..Self::default()
        }
    }

    /// Fix up a bucket read from storage: drop effects that expired while the
    /// game was closed and keep box ids ahead of every collected item.
    pub(crate) fn rehydrate(&mut self, now_ms: u64) {
        let expired = self.effects.tick(now_ms);
        if !expired.is_empty() {
            log::debug!("dropped {} expired effects on load", expired.len());
        }
        let floor = self
            .collection
            .items()
            .iter()
            .map(|item| item.id.saturating_add(1))
            .max()
            .unwrap_or(0);
        self.next_box_id = self.next_box_id.max(floor);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            coins: Self::default_coins(),
            inventory: Inventory::default(),
            effects: EffectEngine::default(),
            collection: Collection::default(),
            next_box_id: 0,
            tutorial: Tutorial::default(),
        }
    }
}
