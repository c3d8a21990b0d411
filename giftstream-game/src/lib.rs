//! GiftStream Game Engine
//!
//! Platform-agnostic economy core for the GiftStream gift-unboxing game.
//! This crate provides all game mechanics without UI or platform-specific dependencies.

pub mod collection;
pub mod config;
pub mod constants;
pub mod conveyor;
pub mod economy;
pub mod effects;
pub mod ledger;
pub mod money;
pub mod numbers;
pub mod rarity;
pub mod rng;
pub mod session;
pub mod shop;
pub mod social;
pub mod state;
pub mod storage;
pub mod tutorial;
pub mod wallet;

use anyhow::Context;

// Re-export commonly used types
pub use collection::{CollectedItem, Collection, item_name};
pub use config::{ConfigError, EconomyConfig};
pub use conveyor::{Conveyor, ConveyorCfg, ConveyorTick, GiftBox};
pub use economy::{EconomyCfg, RarityDraw, TierRange, TierRanges, UnboxOutcome, draw_rarity};
pub use effects::{
    ActiveEffect, EffectCfg, EffectEngine, EffectKind, ExpiredEffects, Inventory, Modifiers,
    PowerUp,
};
pub use ledger::{Ledger, LedgerError};
pub use money::Cents;
pub use rarity::{Rarity, RarityCfg, RarityTable};
pub use rng::RngBundle;
pub use session::{Session, StoredBuckets, TickOutcome, UnboxError};
pub use shop::{CATALOG, ShopCfg, ShopError, ShopItem, ShopState, find_item, find_item_by_key};
pub use social::{Guild, LeaderboardPeriod, Player, SocialError, SocialState};
pub use state::GameState;
pub use storage::{GameStorage, MemoryStorage, load_bucket, save_bucket};
pub use tutorial::{Tutorial, TutorialPage};
pub use wallet::{WalletState, format_tokens};

use constants::{STORAGE_KEY_GAME, STORAGE_KEY_SHOP, STORAGE_KEY_SOCIAL, STORAGE_KEY_WALLET};

const STORAGE_KEYS: [&str; 4] = [
    STORAGE_KEY_WALLET,
    STORAGE_KEY_GAME,
    STORAGE_KEY_SOCIAL,
    STORAGE_KEY_SHOP,
];

/// Main game engine for creating, saving and restoring sessions
pub struct GameEngine<S>
where
    S: GameStorage,
{
    storage: S,
    config: EconomyConfig,
}

impl<S> GameEngine<S>
where
    S: GameStorage,
{
    /// Create a new game engine with the provided storage and tuning
    pub const fn new(storage: S, config: EconomyConfig) -> Self {
        Self { storage, config }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Start a brand-new session, ignoring anything in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the economy configuration is invalid.
    pub fn create_session(&self, seed: u64, now_ms: u64) -> Result<Session, ConfigError> {
        self.config.validate()?;
        Ok(Session::new(seed, self.config.clone(), now_ms))
    }

    /// Persist every bucket of `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket cannot be serialized or written.
    pub fn save_session(&self, session: &Session) -> anyhow::Result<()> {
        save_bucket(&self.storage, STORAGE_KEY_WALLET, session.wallet())?;
        save_bucket(&self.storage, STORAGE_KEY_GAME, session.game())?;
        save_bucket(&self.storage, STORAGE_KEY_SOCIAL, session.social())?;
        save_bucket(&self.storage, STORAGE_KEY_SHOP, session.shop())?;
        log::debug!("saved session (seed {})", session.seed());
        Ok(())
    }

    /// Restore a session from storage. Missing or unreadable buckets fall back
    /// to fresh defaults and effects that expired before `now_ms` are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the economy configuration is invalid.
    pub fn load_session(&self, seed: u64, now_ms: u64) -> anyhow::Result<Session> {
        self.config
            .validate()
            .context("economy configuration is invalid")?;
        let stored = StoredBuckets {
            wallet: load_bucket(&self.storage, STORAGE_KEY_WALLET),
            game: load_bucket(&self.storage, STORAGE_KEY_GAME),
            social: load_bucket(&self.storage, STORAGE_KEY_SOCIAL),
            shop: load_bucket(&self.storage, STORAGE_KEY_SHOP),
        };
        Ok(Session::restore(seed, self.config.clone(), stored, now_ms))
    }

    /// Delete every persisted bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects a removal.
    pub fn clear_saves(&self) -> anyhow::Result<()> {
        for key in STORAGE_KEYS {
            self.storage
                .remove(key)
                .with_context(|| format!("removing {key}"))?;
        }
        Ok(())
    }
}
