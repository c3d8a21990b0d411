//! Power-up shop: catalog, stock, purchases and the restock timer.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::ConfigError;
use crate::constants::RESTOCK_INTERVAL_MS;
use crate::effects::{Inventory, PowerUp};
use crate::ledger::Ledger;
use crate::money::Cents;
use crate::rarity::Rarity;

/// A single item available in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub power_up: PowerUp,
    pub name: &'static str,
    pub desc: &'static str,
    /// Price in coins.
    pub price: Cents,
    pub default_stock: u32,
    pub tier: Rarity,
}

pub const CATALOG: [ShopItem; 5] = [
    ShopItem {
        power_up: PowerUp::SlowMo,
        name: "Slow-Mo Conveyor",
        desc: "Slows down the conveyor for 10 seconds.",
        price: Cents::from_whole(50),
        default_stock: 15,
        tier: Rarity::Common,
    },
    ShopItem {
        power_up: PowerUp::X2Rarity,
        name: "2x Rarity Boost",
        desc: "Doubles rare item chances for 3 drops.",
        price: Cents::from_whole(120),
        default_stock: 8,
        tier: Rarity::Rare,
    },
    ShopItem {
        power_up: PowerUp::Freeze,
        name: "Freeze Time",
        desc: "Freezes the conveyor for 5 seconds.",
        price: Cents::from_whole(85),
        default_stock: 12,
        tier: Rarity::Common,
    },
    ShopItem {
        power_up: PowerUp::Magnet,
        name: "Gift Magnet",
        desc: "Attracts gifts towards your cursor.",
        price: Cents::from_whole(200),
        default_stock: 5,
        tier: Rarity::Epic,
    },
    ShopItem {
        power_up: PowerUp::GoldRush,
        name: "Gold Rush",
        desc: "All gifts give 2x coins for 30 seconds.",
        price: Cents::from_whole(350),
        default_stock: 3,
        tier: Rarity::Legendary,
    },
];

/// Look up a catalog entry.
#[must_use]
pub fn find_item(power_up: PowerUp) -> &'static ShopItem {
    // CATALOG lists every PowerUp variant exactly once.
    match power_up {
        PowerUp::SlowMo => &CATALOG[0],
        PowerUp::X2Rarity => &CATALOG[1],
        PowerUp::Freeze => &CATALOG[2],
        PowerUp::Magnet => &CATALOG[3],
        PowerUp::GoldRush => &CATALOG[4],
    }
}

/// Look up a catalog entry by its string id.
#[must_use]
pub fn find_item_by_key(key: &str) -> Option<&'static ShopItem> {
    PowerUp::from_key(key).map(find_item)
}

/// Errors raised by purchases.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("unknown shop item: {0}")]
    UnknownItem(String),
    #[error("{0} is out of stock")]
    OutOfStock(PowerUp),
    #[error("not enough coins for {item}: price {price}, balance {balance}")]
    InsufficientCoins {
        item: PowerUp,
        price: Cents,
        balance: Cents,
    },
}

/// Restock timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCfg {
    #[serde(default = "ShopCfg::default_restock_interval_ms")]
    pub restock_interval_ms: u64,
}

impl ShopCfg {
    const fn default_restock_interval_ms() -> u64 {
        RESTOCK_INTERVAL_MS
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.restock_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "shop.restock_interval_ms",
            });
        }
        Ok(())
    }
}

impl Default for ShopCfg {
    fn default() -> Self {
        Self {
            restock_interval_ms: Self::default_restock_interval_ms(),
        }
    }
}

fn default_stock() -> BTreeMap<PowerUp, u32> {
    CATALOG
        .iter()
        .map(|item| (item.power_up, item.default_stock))
        .collect()
}

/// Remaining stock per power-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopState {
    #[serde(default = "default_stock")]
    stock: BTreeMap<PowerUp, u32>,
    #[serde(skip)]
    next_restock_ms: Option<u64>,
}

impl Default for ShopState {
    fn default() -> Self {
        Self {
            stock: default_stock(),
            next_restock_ms: None,
        }
    }
}

impl ShopState {
    #[must_use]
    pub fn stock(&self, power_up: PowerUp) -> u32 {
        self.stock.get(&power_up).copied().unwrap_or(0)
    }

    /// Buy one power-up: checks stock, then coins; on success debits the
    /// price, lowers stock and adds the power-up to `inventory`.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::OutOfStock` or `ShopError::InsufficientCoins`; no
    /// state changes on error.
    pub fn buy(
        &mut self,
        power_up: PowerUp,
        coins: &mut Ledger,
        inventory: &mut Inventory,
    ) -> Result<u32, ShopError> {
        let item = find_item(power_up);
        if self.stock(power_up) == 0 {
            return Err(ShopError::OutOfStock(power_up));
        }
        let balance = coins.balance();
        coins
            .debit(item.price)
            .map_err(|_| ShopError::InsufficientCoins {
                item: power_up,
                price: item.price,
                balance,
            })?;
        if let Some(stock) = self.stock.get_mut(&power_up) {
            *stock -= 1;
        }
        log::debug!("bought {power_up} for {} coins", item.price);
        Ok(inventory.add(power_up))
    }

    /// Same as [`ShopState::buy`] keyed by catalog id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownItem` for ids outside the catalog, otherwise
    /// the errors of [`ShopState::buy`].
    pub fn buy_by_key(
        &mut self,
        key: &str,
        coins: &mut Ledger,
        inventory: &mut Inventory,
    ) -> Result<u32, ShopError> {
        let power_up =
            PowerUp::from_key(key).ok_or_else(|| ShopError::UnknownItem(key.to_string()))?;
        self.buy(power_up, coins, inventory)
    }

    /// Reset every item to its default stock.
    pub fn restock(&mut self) {
        self.stock = default_stock();
    }

    /// Run the automatic restock timer. Returns true when a restock happened.
    pub fn tick(&mut self, now_ms: u64, cfg: &ShopCfg) -> bool {
        match self.next_restock_ms {
            None => {
                self.next_restock_ms = Some(now_ms.saturating_add(cfg.restock_interval_ms));
                false
            }
            Some(due) if now_ms >= due => {
                self.restock();
                self.next_restock_ms = Some(now_ms.saturating_add(cfg.restock_interval_ms));
                log::debug!("shop restocked at {now_ms}");
                true
            }
            Some(_) => false,
        }
    }

    /// Whole seconds until the next automatic restock, rounded up.
    #[must_use]
    pub fn seconds_until_restock(&self, now_ms: u64) -> Option<u64> {
        self.next_restock_ms
            .map(|due| due.saturating_sub(now_ms).div_ceil(1_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup_is_consistent() {
        for power_up in PowerUp::ALL {
            assert_eq!(find_item(power_up).power_up, power_up);
        }
        assert_eq!(
            find_item_by_key("goldRush").map(|i| i.price),
            Some(Cents::from_whole(350))
        );
        assert!(find_item_by_key("nope").is_none());
    }

    #[test]
    fn buy_moves_coins_stock_and_inventory() {
        let mut shop = ShopState::default();
        let mut coins = Ledger::with_balance(Cents::from_whole(500));
        let mut inventory = Inventory::new();
        assert_eq!(shop.buy(PowerUp::SlowMo, &mut coins, &mut inventory), Ok(1));
        assert_eq!(coins.balance(), Cents::from_whole(450));
        assert_eq!(shop.stock(PowerUp::SlowMo), 14);
        assert_eq!(inventory.count(PowerUp::SlowMo), 1);
    }

    #[test]
    fn insufficient_coins_changes_nothing() {
        let mut shop = ShopState::default();
        let mut coins = Ledger::with_balance(Cents::from_whole(100));
        let mut inventory = Inventory::new();
        let err = shop
            .buy(PowerUp::GoldRush, &mut coins, &mut inventory)
            .unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientCoins {
                item: PowerUp::GoldRush,
                price: Cents::from_whole(350),
                balance: Cents::from_whole(100),
            }
        );
        assert_eq!(coins.balance(), Cents::from_whole(100));
        assert_eq!(shop.stock(PowerUp::GoldRush), 3);
        assert_eq!(inventory.count(PowerUp::GoldRush), 0);
    }

    #[test]
    fn out_of_stock_is_checked_first() {
        let mut shop = ShopState::default();
        let mut coins = Ledger::with_balance(Cents::from_whole(10_000));
        let mut inventory = Inventory::new();
        for _ in 0..3 {
            shop.buy(PowerUp::GoldRush, &mut coins, &mut inventory)
                .unwrap();
        }
        let before = coins.balance();
        assert_eq!(
            shop.buy(PowerUp::GoldRush, &mut coins, &mut inventory),
            Err(ShopError::OutOfStock(PowerUp::GoldRush))
        );
        assert_eq!(coins.balance(), before);
        shop.restock();
        assert_eq!(shop.stock(PowerUp::GoldRush), 3);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut shop = ShopState::default();
        let mut coins = Ledger::default();
        let mut inventory = Inventory::new();
        assert_eq!(
            shop.buy_by_key("laser", &mut coins, &mut inventory),
            Err(ShopError::UnknownItem("laser".to_string()))
        );
    }

    #[test]
    fn restock_timer_fires_every_interval() {
        let cfg = ShopCfg::default();
        let mut shop = ShopState::default();
        let mut coins = Ledger::with_balance(Cents::from_whole(1_000));
        let mut inventory = Inventory::new();
        assert!(!shop.tick(0, &cfg));
        shop.buy(PowerUp::Magnet, &mut coins, &mut inventory)
            .unwrap();
        assert_eq!(shop.seconds_until_restock(500), Some(60));
        assert!(!shop.tick(59_999, &cfg));
        assert!(shop.tick(60_000, &cfg));
        assert_eq!(shop.stock(PowerUp::Magnet), 5);
        assert_eq!(shop.seconds_until_restock(60_000), Some(60));
    }

    #[test]
    fn stock_serializes_by_power_up_key() {
        let json = serde_json::to_value(ShopState::default()).unwrap();
        assert_eq!(json["stock"]["slowMo"], 15);
        assert_eq!(json["stock"]["goldRush"], 3);
    }
}
