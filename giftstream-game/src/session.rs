//! Application controller owning every piece of state.
//!
//! The host drives a [`Session`] by calling [`Session::tick`] with the current
//! time and invoking player actions in between. Nothing here reads a clock.
use smallvec::SmallVec;
use thiserror::Error;

use crate::collection::{CollectedItem, item_name};
use crate::config::EconomyConfig;
use crate::conveyor::{Conveyor, GiftBox};
use crate::economy::{UnboxOutcome, draw_rarity};
use crate::effects::{ExpiredEffects, Modifiers, PowerUp};
use crate::ledger::LedgerError;
use crate::money::Cents;
use crate::rng::RngBundle;
use crate::shop::{ShopError, ShopState};
use crate::social::{Guild, LeaderboardPeriod, Player, SocialError, SocialState};
use crate::state::GameState;
use crate::tutorial::Tutorial;
use crate::wallet::WalletState;

/// Reasons an unboxing is refused. The box stays on the belt in every case.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum UnboxError {
    #[error("box {0} is not on the belt")]
    UnknownBox(u64),
    #[error("the belt is frozen")]
    Frozen,
    #[error("wallet is not connected")]
    WalletDisconnected,
    #[error("box costs {cost} but the wallet holds {balance}")]
    InsufficientFunds { cost: Cents, balance: Cents },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Everything that changed during one [`Session::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub spawned: Option<GiftBox>,
    pub fell_off: SmallVec<[GiftBox; 2]>,
    pub expired: ExpiredEffects,
    pub restocked: bool,
}

/// Buckets read back from storage; `None` means "start fresh".
#[derive(Debug, Clone, Default)]
pub struct StoredBuckets {
    pub wallet: Option<WalletState>,
    pub game: Option<GameState>,
    pub social: Option<SocialState>,
    pub shop: Option<ShopState>,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: EconomyConfig,
    rng: RngBundle,
    wallet: WalletState,
    game: GameState,
    social: SocialState,
    shop: ShopState,
    conveyor: Conveyor,
    selected_box: Option<u64>,
    now_ms: u64,
}

impl Session {
    /// Fresh session: disconnected wallet, starting coins, mock social graph.
    #[must_use]
    pub fn new(seed: u64, config: EconomyConfig, now_ms: u64) -> Self {
        Self::restore(seed, config, StoredBuckets::default(), now_ms)
    }

    /// Rebuild a session from stored buckets, filling gaps with defaults.
    #[must_use]
    pub fn restore(seed: u64, config: EconomyConfig, stored: StoredBuckets, now_ms: u64) -> Self {
        let rng = RngBundle::from_user_seed(seed);
        let mut game = stored.game.unwrap_or_else(|| GameState::new(&config));
        game.rehydrate(now_ms);
        let social = stored
            .social
            .unwrap_or_else(|| SocialState::new(&mut *rng.social(), now_ms));
        let conveyor = Conveyor::new(game.next_box_id, &config.conveyor);
        Self {
            wallet: stored.wallet.unwrap_or_default(),
            shop: stored.shop.unwrap_or_default(),
            config,
            rng,
            game,
            social,
            conveyor,
            selected_box: None,
            now_ms,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Time of the latest tick or action.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn wallet(&self) -> &WalletState {
        &self.wallet
    }

    #[must_use]
    pub const fn game(&self) -> &GameState {
        &self.game
    }

    #[must_use]
    pub const fn social(&self) -> &SocialState {
        &self.social
    }

    #[must_use]
    pub const fn shop(&self) -> &ShopState {
        &self.shop
    }

    #[must_use]
    pub fn boxes(&self) -> &[GiftBox] {
        self.conveyor.boxes()
    }

    #[must_use]
    pub const fn coins(&self) -> Cents {
        self.game.coins.balance()
    }

    #[must_use]
    pub const fn tutorial(&self) -> &Tutorial {
        &self.game.tutorial
    }

    pub const fn tutorial_mut(&mut self) -> &mut Tutorial {
        &mut self.game.tutorial
    }

    /// Modifiers in force at the session's current time.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.game
            .effects
            .modifiers(self.now_ms, &self.config.effects)
    }

    fn advance(&mut self, now_ms: u64) -> u64 {
        self.now_ms = self.now_ms.max(now_ms);
        self.now_ms
    }

    /// Advance everything to `now_ms`: expire effects, move the belt, spawn a
    /// box when due and run the shop restock timer. Time never runs backwards;
    /// an earlier `now_ms` is treated as the latest time seen.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let now_ms = self.advance(now_ms);
        let expired = self.game.effects.tick(now_ms);

        let mut belt_mods = self.modifiers();
        belt_mods.frozen |= self.selected_box.is_some();
        let config = &self.config;
        let effects = &mut self.game.effects;
        let rng = &self.rng;
        let belt = self
            .conveyor
            .tick(now_ms, &belt_mods, &config.conveyor, || {
                let draw = draw_rarity(&config.rarity, effects, &mut *rng.rarity());
                let cost = config
                    .economy
                    .generate_cost(draw.rarity, &mut *rng.cost());
                (draw.rarity, cost)
            });
        self.game.next_box_id = self.conveyor.next_id();

        let restocked = self.shop.tick(now_ms, &self.config.shop);
        TickOutcome {
            spawned: belt.spawned,
            fell_off: belt.fell_off,
            expired,
            restocked,
        }
    }

    /// Hold a box for confirmation. The belt pauses until the box is unboxed
    /// or the selection is cancelled.
    ///
    /// # Errors
    ///
    /// `UnboxError::UnknownBox` or `UnboxError::Frozen`.
    pub fn select_box(&mut self, box_id: u64) -> Result<&GiftBox, UnboxError> {
        if self.conveyor.get(box_id).is_none() {
            return Err(UnboxError::UnknownBox(box_id));
        }
        if self.modifiers().frozen {
            return Err(UnboxError::Frozen);
        }
        self.selected_box = Some(box_id);
        self.conveyor
            .get(box_id)
            .ok_or(UnboxError::UnknownBox(box_id))
    }

    pub fn cancel_selection(&mut self) {
        self.selected_box = None;
    }

    #[must_use]
    pub const fn selected_box(&self) -> Option<u64> {
        self.selected_box
    }

    /// Open a box: pay its cost from the wallet, draw the reward, credit the
    /// wallet and the coin purse, record the profit and file the item.
    ///
    /// # Errors
    ///
    /// Fails without changing any state when the box is gone, the belt is
    /// frozen, the wallet is disconnected or cannot cover the cost.
    pub fn unbox(&mut self, box_id: u64, now_ms: u64) -> Result<UnboxOutcome, UnboxError> {
        let now_ms = self.advance(now_ms);
        let gift = *self
            .conveyor
            .get(box_id)
            .ok_or(UnboxError::UnknownBox(box_id))?;
        let modifiers = self.modifiers();
        if modifiers.frozen {
            return Err(UnboxError::Frozen);
        }
        if !self.wallet.connected {
            return Err(UnboxError::WalletDisconnected);
        }
        if !self.wallet.balance.can_afford(gift.cost) {
            return Err(UnboxError::InsufficientFunds {
                cost: gift.cost,
                balance: self.wallet.balance(),
            });
        }

        self.wallet.balance.debit(gift.cost)?;
        self.conveyor.take(box_id);
        if self.selected_box == Some(box_id) {
            self.selected_box = None;
        }

        let reward = self
            .config
            .economy
            .generate_reward(gift.cost, gift.rarity, &mut *self.rng.reward());
        self.wallet.balance.credit(reward)?;
        let coins = self
            .game
            .coins
            .credit_scaled(reward, modifiers.reward_multiplier)?;
        let profit = reward - gift.cost;
        self.social.record_profit(profit);

        let name = item_name(gift.rarity, &mut *self.rng.names());
        self.game.collection.push(CollectedItem {
            id: gift.id,
            name: name.to_string(),
            rarity: gift.rarity,
            collected_at_ms: now_ms,
            value: reward,
        });
        log::debug!(
            "unboxed {} ({}) cost {} reward {} profit {profit}",
            gift.id,
            gift.rarity,
            gift.cost,
            reward
        );
        Ok(UnboxOutcome {
            box_id: gift.id,
            rarity: gift.rarity,
            cost: gift.cost,
            reward,
            profit,
            coins,
        })
    }

    /// Consume one power-up from the inventory. Returns false when none are held.
    pub fn use_power_up(&mut self, power_up: PowerUp, now_ms: u64) -> bool {
        let now_ms = self.advance(now_ms);
        let game = &mut self.game;
        let used =
            game.effects
                .use_power_up(&mut game.inventory, power_up, now_ms, &self.config.effects);
        if used {
            log::debug!("used {power_up} at {now_ms}");
        }
        used
    }

    /// # Errors
    ///
    /// See [`ShopState::buy`].
    pub fn buy_power_up(&mut self, power_up: PowerUp) -> Result<u32, ShopError> {
        let game = &mut self.game;
        self.shop
            .buy(power_up, &mut game.coins, &mut game.inventory)
    }

    /// # Errors
    ///
    /// See [`ShopState::buy_by_key`].
    pub fn buy_power_up_by_key(&mut self, key: &str) -> Result<u32, ShopError> {
        let game = &mut self.game;
        self.shop
            .buy_by_key(key, &mut game.coins, &mut game.inventory)
    }

    pub fn restock_shop(&mut self) {
        self.shop.restock();
    }

    /// Connect the mock wallet; returns its address.
    pub fn connect_wallet(&mut self) -> &str {
        let grant = self.config.wallet_grant;
        self.wallet.connect(&mut *self.rng.wallet(), grant)
    }

    pub fn disconnect_wallet(&mut self) {
        self.wallet.disconnect();
    }

    /// # Errors
    ///
    /// See [`SocialState::add_friend`].
    pub fn add_friend(&mut self, player_id: &str) -> Result<&Player, SocialError> {
        self.social
            .add_friend(player_id, &mut *self.rng.social(), self.now_ms)
    }

    /// # Errors
    ///
    /// See [`SocialState::remove_friend`].
    pub fn remove_friend(&mut self, player_id: &str) -> Result<Player, SocialError> {
        self.social.remove_friend(player_id)
    }

    /// # Errors
    ///
    /// See [`SocialState::accept_request`].
    pub fn accept_request(&mut self, player_id: &str) -> Result<(), SocialError> {
        self.social.accept_request(player_id)
    }

    /// # Errors
    ///
    /// See [`SocialState::reject_request`].
    pub fn reject_request(&mut self, player_id: &str) -> Result<(), SocialError> {
        self.social.reject_request(player_id)
    }

    /// # Errors
    ///
    /// See [`SocialState::create_guild`].
    pub fn create_guild(&mut self, name: &str, tag: &str) -> Result<&Guild, SocialError> {
        self.social
            .create_guild(name, tag, &mut *self.rng.social(), self.now_ms)
    }

    /// # Errors
    ///
    /// See [`SocialState::join_guild`].
    pub fn join_guild(&mut self, guild_id: &str) -> Result<&Guild, SocialError> {
        self.social
            .join_guild(guild_id, &mut *self.rng.social(), self.now_ms)
    }

    /// # Errors
    ///
    /// See [`SocialState::leave_guild`].
    pub fn leave_guild(&mut self) -> Result<Guild, SocialError> {
        self.social.leave_guild()
    }

    #[must_use]
    pub fn leaderboard(&self, period: LeaderboardPeriod) -> Vec<&Player> {
        self.social.leaderboard(period)
    }
}
