use std::fmt;

use giftstream_game::{EffectKind, GiftBox, PowerUp, Session, find_item};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// One player action chosen between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Wait,
    Unbox(u64),
    Buy(PowerUp),
    Use(PowerUp),
}

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: Action,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(action: Action, rationale: Option<String>) -> Self {
        Self { action, rationale }
    }

    #[must_use]
    pub const fn wait() -> Self {
        Self::new(Action::Wait, None)
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next action for the current session state.
    fn decide(&mut self, session: &Session) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameplayStrategy {
    Cautious,
    Greedy,
    PowerUser,
    MonteCarlo,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::Cautious,
        Self::Greedy,
        Self::PowerUser,
        Self::MonteCarlo,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Greedy => "Greedy",
            Self::PowerUser => "Power User",
            Self::MonteCarlo => "Monte Carlo",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::PowerUser => Box::new(PowerUserPolicy),
            Self::MonteCarlo => Box::new(MonteCarloPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct GreedyPolicy;
struct PowerUserPolicy;

struct MonteCarloPolicy {
    rng: ChaCha20Rng,
    patience: f64,
}

impl MonteCarloPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            patience: 0.6,
        }
    }
}

fn unboxable(session: &Session) -> impl Iterator<Item = &GiftBox> {
    let balance = session.wallet().balance();
    let usable = session.wallet().connected && !session.modifiers().frozen;
    session
        .boxes()
        .iter()
        .filter(move |gift| usable && gift.cost <= balance)
}

fn can_buy(session: &Session, power_up: PowerUp) -> bool {
    session.shop().stock(power_up) > 0 && session.coins() >= find_item(power_up).price
}

fn owns(session: &Session, power_up: PowerUp) -> bool {
    session.game().inventory.count(power_up) > 0
}

fn effect_active(session: &Session, kind: EffectKind) -> bool {
    session.game().effects.is_active(kind, session.now_ms())
}

fn unbox_decision(gift: &GiftBox, why: &str) -> PolicyDecision {
    PolicyDecision::new(
        Action::Unbox(gift.id),
        Some(format!("{why}: {} box for {}", gift.rarity, gift.cost)),
    )
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn decide(&mut self, session: &Session) -> PolicyDecision {
        // Only risk a fifth of the wallet on any one box.
        let budget = session.wallet().balance().scale(0.2);
        unboxable(session)
            .filter(|gift| gift.cost <= budget)
            .min_by_key(|gift| gift.cost)
            .map_or_else(PolicyDecision::wait, |gift| unbox_decision(gift, "cheapest"))
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn decide(&mut self, session: &Session) -> PolicyDecision {
        if owns(session, PowerUp::GoldRush) && !effect_active(session, EffectKind::RewardMultiplier)
        {
            return PolicyDecision::new(Action::Use(PowerUp::GoldRush), None);
        }
        if !owns(session, PowerUp::GoldRush) && can_buy(session, PowerUp::GoldRush) {
            return PolicyDecision::new(Action::Buy(PowerUp::GoldRush), None);
        }
        unboxable(session)
            .max_by(|a, b| a.rarity.cmp(&b.rarity).then(b.cost.cmp(&a.cost)))
            .map_or_else(PolicyDecision::wait, |gift| unbox_decision(gift, "rarest"))
    }
}

impl PlayerPolicy for PowerUserPolicy {
    fn name(&self) -> &'static str {
        "Power User"
    }

    fn decide(&mut self, session: &Session) -> PolicyDecision {
        let charges = session.game().effects.boost_charges();
        if charges == 0 && owns(session, PowerUp::X2Rarity) {
            return PolicyDecision::new(Action::Use(PowerUp::X2Rarity), Some("boost".into()));
        }
        if owns(session, PowerUp::SlowMo) && !effect_active(session, EffectKind::SpeedBoost) {
            return PolicyDecision::new(Action::Use(PowerUp::SlowMo), Some("slow belt".into()));
        }
        for power_up in [PowerUp::X2Rarity, PowerUp::SlowMo] {
            if !owns(session, power_up) && can_buy(session, power_up) {
                return PolicyDecision::new(Action::Buy(power_up), None);
            }
        }
        unboxable(session)
            .max_by_key(|gift| (gift.rarity, std::cmp::Reverse(gift.cost)))
            .map_or_else(PolicyDecision::wait, |gift| unbox_decision(gift, "best tier"))
    }
}

impl PlayerPolicy for MonteCarloPolicy {
    fn name(&self) -> &'static str {
        "Monte Carlo"
    }

    fn decide(&mut self, session: &Session) -> PolicyDecision {
        if self.rng.r#gen::<f64>() < self.patience {
            return PolicyDecision::wait();
        }
        let mut options: Vec<Action> = unboxable(session).map(|g| Action::Unbox(g.id)).collect();
        for power_up in PowerUp::ALL {
            if can_buy(session, power_up) {
                options.push(Action::Buy(power_up));
            }
            if owns(session, power_up) {
                options.push(Action::Use(power_up));
            }
        }
        if options.is_empty() {
            return PolicyDecision::wait();
        }
        let action = options[self.rng.gen_range(0..options.len())];
        PolicyDecision::new(action, Some(format!("1 of {}", options.len())))
    }
}
