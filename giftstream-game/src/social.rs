//! Player profile, friends, guilds and leaderboards.
//!
//! Other players are mock data drawn from the social RNG stream; nothing here
//! talks to a server.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::constants::{INITIAL_FRIENDS, INITIAL_PENDING_REQUESTS, MY_PLAYER_ID};
use crate::money::Cents;

const FIRST_NAMES: [&str; 10] = [
    "Shadow", "Crystal", "Golden", "Silver", "Lucky", "Mystic", "Frost", "Storm", "Blazing",
    "Cosmic",
];
const LAST_NAMES: [&str; 10] = [
    "Hunter", "Master", "Wolf", "Dragon", "Phoenix", "Tiger", "Hawk", "Bear", "Fox", "Lion",
];
const AVATARS: [&str; 10] = ["🎅", "🎄", "⛄", "🦌", "🎁", "❄️", "🌟", "🔔", "🍪", "🎿"];
const MY_NAME: &str = "You";
const MY_AVATAR: &str = "🎮";

const JOINED_WINDOW_MS: u64 = 30 * 24 * 60 * 60 * 1_000;
const JOINED_GUILD_NAME: &str = "GiftMasters";
const JOINED_GUILD_TAG: &str = "GIFT";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocialError {
    #[error("player {0} is unknown")]
    UnknownPlayer(String),
    #[error("no pending request from {0}")]
    UnknownRequest(String),
    #[error("{0} is already a friend")]
    AlreadyFriends(String),
    #[error("cannot befriend yourself")]
    SelfFriend,
    #[error("already a member of guild {0}")]
    AlreadyInGuild(String),
    #[error("not a member of any guild")]
    NotInGuild,
    #[error("guild name and tag must not be empty")]
    InvalidGuild,
}

/// Time window a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    Today,
    Week,
    Month,
    Year,
}

impl LeaderboardPeriod {
    pub const ALL: [Self; 4] = [Self::Today, Self::Week, Self::Month, Self::Year];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for LeaderboardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub total_profit: Cents,
    pub profit_today: Cents,
    pub profit_week: Cents,
    pub profit_month: Cents,
    pub profit_year: Cents,
    pub unbox_count: u32,
    pub joined_at_ms: u64,
    pub online: bool,
}

impl Player {
    /// The local player's fresh profile.
    #[must_use]
    pub fn me(now_ms: u64) -> Self {
        Self {
            id: MY_PLAYER_ID.to_string(),
            name: MY_NAME.to_string(),
            avatar: MY_AVATAR.to_string(),
            total_profit: Cents::ZERO,
            profit_today: Cents::ZERO,
            profit_week: Cents::ZERO,
            profit_month: Cents::ZERO,
            profit_year: Cents::ZERO,
            unbox_count: 0,
            joined_at_ms: now_ms,
            online: true,
        }
    }

    /// A random stranger with plausible stats.
    pub fn mock<R: Rng + ?Sized>(id: String, rng: &mut R, now_ms: u64) -> Self {
        let name = format!(
            "{}{}{}",
            FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())],
            LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())],
            rng.gen_range(0..100)
        );
        let avatar = AVATARS[rng.gen_range(0..AVATARS.len())].to_string();
        let total_profit = Cents::from_units(rng.gen_range(-500.0..1_500.0));
        let profit_today = Cents::from_units(rng.gen_range(-50.0..150.0));
        let profit_week = Cents::from_units(rng.gen_range(-100.0..400.0));
        let profit_month = Cents::from_units(rng.gen_range(-200.0..800.0));
        let unbox_count = rng.gen_range(10..510);
        let joined_at_ms = now_ms.saturating_sub(rng.gen_range(0..JOINED_WINDOW_MS));
        let online = rng.r#gen::<f64>() > 0.6;
        Self {
            id,
            name,
            avatar,
            total_profit,
            profit_today,
            profit_week,
            profit_month,
            profit_year: total_profit,
            unbox_count,
            joined_at_ms,
            online,
        }
    }

    #[must_use]
    pub const fn profit(&self, period: LeaderboardPeriod) -> Cents {
        match period {
            LeaderboardPeriod::Today => self.profit_today,
            LeaderboardPeriod::Week => self.profit_week,
            LeaderboardPeriod::Month => self.profit_month,
            LeaderboardPeriod::Year => self.profit_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub tag: String,
    pub owner_id: String,
    pub member_ids: Vec<String>,
    pub created_at_ms: u64,
    pub total_profit: Cents,
}

/// Everything persisted under the social bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialState {
    pub profile: Player,
    #[serde(default)]
    pub friends: Vec<Player>,
    #[serde(default)]
    pub pending: Vec<Player>,
    #[serde(default)]
    pub guild: Option<Guild>,
    /// Other members of the current guild; the local player is not repeated here.
    #[serde(default)]
    pub guild_members: Vec<Player>,
    #[serde(default)]
    next_mock_id: u64,
}

impl SocialState {
    /// Fresh state seeded with mock friends and pending requests.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, now_ms: u64) -> Self {
        let mut state = Self {
            profile: Player::me(now_ms),
            friends: Vec::new(),
            pending: Vec::new(),
            guild: None,
            guild_members: Vec::new(),
            next_mock_id: 0,
        };
        state.friends = state.mock_players(INITIAL_FRIENDS, rng, now_ms);
        state.pending = state.mock_players(INITIAL_PENDING_REQUESTS, rng, now_ms);
        state
    }

    fn mock_players<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
        now_ms: u64,
    ) -> Vec<Player> {
        (0..count)
            .map(|_| {
                let id = format!("player_{}", self.next_mock_id);
                self.next_mock_id += 1;
                Player::mock(id, rng, now_ms)
            })
            .collect()
    }

    /// Add an unbox result to every profit period and bump the unbox count.
    pub fn record_profit(&mut self, profit: Cents) {
        let profile = &mut self.profile;
        profile.total_profit += profit;
        profile.profit_today += profit;
        profile.profit_week += profit;
        profile.profit_month += profit;
        profile.profit_year += profit;
        profile.unbox_count = profile.unbox_count.saturating_add(1);
    }

    #[must_use]
    pub fn is_friend(&self, player_id: &str) -> bool {
        self.friends.iter().any(|f| f.id == player_id)
    }

    /// # Errors
    ///
    /// Fails for the local player's own id or an existing friend.
    pub fn add_friend<R: Rng + ?Sized>(
        &mut self,
        player_id: &str,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<&Player, SocialError> {
        if player_id == MY_PLAYER_ID {
            return Err(SocialError::SelfFriend);
        }
        if self.is_friend(player_id) {
            return Err(SocialError::AlreadyFriends(player_id.to_string()));
        }
        self.friends
            .push(Player::mock(player_id.to_string(), rng, now_ms));
        Ok(&self.friends[self.friends.len() - 1])
    }

    /// # Errors
    ///
    /// `SocialError::UnknownPlayer` when `player_id` is not a friend.
    pub fn remove_friend(&mut self, player_id: &str) -> Result<Player, SocialError> {
        let idx = self
            .friends
            .iter()
            .position(|f| f.id == player_id)
            .ok_or_else(|| SocialError::UnknownPlayer(player_id.to_string()))?;
        Ok(self.friends.remove(idx))
    }

    fn take_request(&mut self, player_id: &str) -> Result<Player, SocialError> {
        let idx = self
            .pending
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| SocialError::UnknownRequest(player_id.to_string()))?;
        Ok(self.pending.remove(idx))
    }

    /// Move a pending request into the friend list.
    ///
    /// # Errors
    ///
    /// `SocialError::UnknownRequest` when no such request is pending.
    pub fn accept_request(&mut self, player_id: &str) -> Result<(), SocialError> {
        let player = self.take_request(player_id)?;
        if !self.is_friend(&player.id) {
            self.friends.push(player);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `SocialError::UnknownRequest` when no such request is pending.
    pub fn reject_request(&mut self, player_id: &str) -> Result<(), SocialError> {
        self.take_request(player_id).map(|_| ())
    }

    /// Found a guild owned by the local player, with 5 to 24 mock members.
    ///
    /// # Errors
    ///
    /// Fails when already in a guild or when `name`/`tag` are blank.
    pub fn create_guild<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        tag: &str,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<&Guild, SocialError> {
        let (name, tag) = (name.trim(), tag.trim());
        if name.is_empty() || tag.is_empty() {
            return Err(SocialError::InvalidGuild);
        }
        self.ensure_guildless()?;
        let count = rng.gen_range(5..25);
        let members = self.mock_players(count, rng, now_ms);
        let guild = build_guild(
            format!("guild_{now_ms}"),
            name.to_string(),
            tag.to_uppercase(),
            MY_PLAYER_ID.to_string(),
            now_ms,
            &members,
        );
        Ok(self.enter_guild(guild, members))
    }

    /// Join an existing guild with 10 to 39 mock members.
    ///
    /// # Errors
    ///
    /// `SocialError::AlreadyInGuild` when already a member elsewhere.
    pub fn join_guild<R: Rng + ?Sized>(
        &mut self,
        guild_id: &str,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<&Guild, SocialError> {
        self.ensure_guildless()?;
        let count = rng.gen_range(10..40);
        let members = self.mock_players(count, rng, now_ms);
        let owner = members
            .first()
            .map_or_else(|| MY_PLAYER_ID.to_string(), |m| m.id.clone());
        let guild = build_guild(
            guild_id.to_string(),
            JOINED_GUILD_NAME.to_string(),
            JOINED_GUILD_TAG.to_string(),
            owner,
            now_ms.saturating_sub(JOINED_WINDOW_MS),
            &members,
        );
        Ok(self.enter_guild(guild, members))
    }

    /// # Errors
    ///
    /// `SocialError::NotInGuild` when there is nothing to leave.
    pub fn leave_guild(&mut self) -> Result<Guild, SocialError> {
        let guild = self.guild.take().ok_or(SocialError::NotInGuild)?;
        self.guild_members.clear();
        log::debug!("left guild {}", guild.name);
        Ok(guild)
    }

    fn ensure_guildless(&self) -> Result<(), SocialError> {
        match &self.guild {
            Some(guild) => Err(SocialError::AlreadyInGuild(guild.name.clone())),
            None => Ok(()),
        }
    }

    fn enter_guild(&mut self, guild: Guild, members: Vec<Player>) -> &Guild {
        log::debug!(
            "joined guild {} [{}] with {} members",
            guild.name,
            guild.tag,
            guild.member_ids.len()
        );
        self.guild_members = members;
        self.guild.insert(guild)
    }

    /// Local player, friends and guild members, deduplicated by id and sorted by
    /// the period's profit, highest first.
    #[must_use]
    pub fn leaderboard(&self, period: LeaderboardPeriod) -> Vec<&Player> {
        let mut seen = HashSet::new();
        let mut players: Vec<&Player> = std::iter::once(&self.profile)
            .chain(&self.friends)
            .chain(&self.guild_members)
            .filter(|p| seen.insert(p.id.as_str()))
            .collect();
        players.sort_by(|a, b| b.profit(period).cmp(&a.profit(period)));
        players
    }
}

fn build_guild(
    id: String,
    name: String,
    tag: String,
    owner_id: String,
    created_at_ms: u64,
    members: &[Player],
) -> Guild {
    let member_ids = std::iter::once(MY_PLAYER_ID.to_string())
        .chain(members.iter().map(|m| m.id.clone()))
        .collect();
    Guild {
        id,
        name,
        tag,
        owner_id,
        member_ids,
        created_at_ms,
        total_profit: members.iter().map(|m| m.total_profit).sum(),
    }
}
