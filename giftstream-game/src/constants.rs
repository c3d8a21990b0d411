//! Centralized balance and tuning constants for the GiftStream economy.
//!
//! These are the defaults behind `EconomyConfig`. Hosts may override them via
//! JSON, but the values here are what the shipped game plays with.

// Rarity thresholds (cumulative upper bounds for common, rare, epic) -------
pub const BASELINE_COMMON_BELOW: f64 = 0.50;
pub const BASELINE_RARE_BELOW: f64 = 0.80;
pub const BASELINE_EPIC_BELOW: f64 = 0.95;
pub const BOOSTED_COMMON_BELOW: f64 = 0.25;
pub const BOOSTED_RARE_BELOW: f64 = 0.55;
pub const BOOSTED_EPIC_BELOW: f64 = 0.85;

// Cost ranges in tokens ----------------------------------------------------
pub const COST_COMMON: (f64, f64) = (1.0, 5.0);
pub const COST_RARE: (f64, f64) = (3.0, 10.0);
pub const COST_EPIC: (f64, f64) = (8.0, 25.0);
pub const COST_LEGENDARY: (f64, f64) = (20.0, 50.0);

// Reward multiplier ranges -------------------------------------------------
pub const REWARD_COMMON: (f64, f64) = (0.5, 2.0);
pub const REWARD_RARE: (f64, f64) = (0.8, 3.0);
pub const REWARD_EPIC: (f64, f64) = (1.0, 5.0);
pub const REWARD_LEGENDARY: (f64, f64) = (1.5, 10.0);

// Power-up effects ---------------------------------------------------------
pub const SLOW_MO_DURATION_MS: u64 = 10_000;
pub const SLOW_MO_SPEED_MULTIPLIER: f64 = 0.3;
pub const FREEZE_DURATION_MS: u64 = 5_000;
pub const GOLD_RUSH_DURATION_MS: u64 = 30_000;
pub const GOLD_RUSH_MULTIPLIER: f64 = 2.0;
pub const MAGNET_DURATION_MS: u64 = 15_000;
pub const RARITY_BOOST_CHARGES: u32 = 3;

// Conveyor -----------------------------------------------------------------
pub const SPAWN_INTERVAL_MS: u64 = 1_200;
pub const BELT_TRAVEL_MS: u64 = 8_000;
pub const MAX_BOXES_ON_BELT: usize = 6;

// Shop ---------------------------------------------------------------------
pub const RESTOCK_INTERVAL_MS: u64 = 60_000;

// Balances -----------------------------------------------------------------
pub const STARTING_COINS: i64 = 500;
pub const WALLET_CONNECT_GRANT: i64 = 100;
pub const TOKEN_SYMBOL: &str = "GIFT";

// Social -------------------------------------------------------------------
pub const INITIAL_FRIENDS: usize = 5;
pub const INITIAL_PENDING_REQUESTS: usize = 2;
pub const MY_PLAYER_ID: &str = "me";

// Storage keys -------------------------------------------------------------
pub const STORAGE_KEY_WALLET: &str = "giftstream.wallet";
pub const STORAGE_KEY_GAME: &str = "giftstream.game";
pub const STORAGE_KEY_SOCIAL: &str = "giftstream.social";
pub const STORAGE_KEY_SHOP: &str = "giftstream.shop";
