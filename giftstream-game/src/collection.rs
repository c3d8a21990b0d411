//! History of unboxed items.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::money::Cents;
use crate::rarity::Rarity;

const COMMON_NAMES: [&str; 4] = ["Small Gift", "Mini Box", "Tiny Present", "Little Surprise"];
const RARE_NAMES: [&str; 4] = ["Nice Gift", "Blue Box", "Special Present", "Cool Surprise"];
const EPIC_NAMES: [&str; 4] = ["Great Gift", "Purple Box", "Rare Present", "Amazing Find"];
const LEGENDARY_NAMES: [&str; 4] = [
    "Jackpot Gift",
    "Golden Box",
    "Legendary Present",
    "Ultimate Prize",
];

/// Pick a display name themed to the rarity.
pub fn item_name<R: Rng + ?Sized>(rarity: Rarity, rng: &mut R) -> &'static str {
    let names = match rarity {
        Rarity::Common => &COMMON_NAMES,
        Rarity::Rare => &RARE_NAMES,
        Rarity::Epic => &EPIC_NAMES,
        Rarity::Legendary => &LEGENDARY_NAMES,
    };
    names[rng.gen_range(0..names.len())]
}

/// One opened gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedItem {
    pub id: u64,
    pub name: String,
    pub rarity: Rarity,
    pub collected_at_ms: u64,
    pub value: Cents,
}

/// Everything the player has unboxed, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    items: Vec<CollectedItem>,
}

impl Collection {
    pub fn push(&mut self, item: CollectedItem) {
        self.items.push(item);
    }

    #[must_use]
    pub fn items(&self) -> &[CollectedItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn total_value(&self) -> Cents {
        self.items.iter().map(|item| item.value).sum()
    }

    #[must_use]
    pub fn count_by_rarity(&self, rarity: Rarity) -> usize {
        self.items.iter().filter(|item| item.rarity == rarity).count()
    }

    /// Most recent items first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &CollectedItem> {
        self.items.iter().rev().take(limit)
    }
}
