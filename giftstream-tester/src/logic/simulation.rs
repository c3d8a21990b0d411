use anyhow::{Context, Result};
use giftstream_game::{
    Cents, GameEngine, GameStorage, GiftBox, PowerUp, Rarity, Session, TickOutcome, find_item,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::logic::policy::{Action, GameplayStrategy, PlayerPolicy};

pub const DEFAULT_DURATION_MS: u64 = 120_000;
pub const DEFAULT_TICK_MS: u64 = 100;

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub duration_ms: u64,
    pub tick_ms: u64,
    pub connect_wallet: bool,
    /// Save and reload the session through storage at this cadence.
    pub reload_every_ms: Option<u64>,
    pub setup: Option<fn(&mut Session)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            duration_ms: DEFAULT_DURATION_MS,
            tick_ms: DEFAULT_TICK_MS,
            connect_wallet: true,
            reload_every_ms: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub const fn without_wallet(mut self) -> Self {
        self.connect_wallet = false;
        self
    }

    #[must_use]
    pub const fn with_reload_every_ms(mut self, interval_ms: u64) -> Self {
        self.reload_every_ms = Some(interval_ms);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut Session)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Counters and final balances of one simulated session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: Option<GameplayStrategy>,
    pub ticks: u64,
    pub spawned: u64,
    pub fell_off: u64,
    pub unboxed: u64,
    pub refused: u64,
    pub purchases: u64,
    pub power_ups_used: u64,
    pub restocks: u64,
    pub reloads: u64,
    pub starting_wallet: Cents,
    pub total_cost: Cents,
    pub total_reward: Cents,
    pub coins_earned: Cents,
    pub rarity_counts: BTreeMap<Rarity, u64>,
    pub boosted_spawns: u64,
    pub final_wallet: Cents,
    pub final_coins: Cents,
    pub final_profit: Cents,
    pub collection_size: usize,
    /// Invariant breaches observed during the run.
    pub violations: Vec<String>,
    /// Ordered event log; identical seeds must produce identical transcripts.
    #[serde(skip)]
    pub transcript: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn net_profit(&self) -> Cents {
        self.total_reward - self.total_cost
    }
}

/// Drives one session with a policy and checks economy invariants at every step.
pub struct SimulationSession<'a, S: GameStorage> {
    engine: &'a GameEngine<S>,
    session: Session,
    policy: Box<dyn PlayerPolicy + Send>,
    plan: SimulationPlan,
    summary: SimulationSummary,
    seen_ids: HashSet<u64>,
}

impl<'a, S: GameStorage> SimulationSession<'a, S> {
    /// Build a fresh session for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine's economy configuration is invalid.
    pub fn new(engine: &'a GameEngine<S>, plan: SimulationPlan, seed: u64) -> Result<Self> {
        let mut session = engine
            .create_session(seed, 0)
            .context("creating simulation session")?;
        if plan.connect_wallet {
            session.connect_wallet();
        }
        if let Some(setup) = plan.setup {
            setup(&mut session);
        }
        let summary = SimulationSummary {
            seed,
            strategy: Some(plan.strategy),
            starting_wallet: session.wallet().balance(),
            ..SimulationSummary::default()
        };
        Ok(Self {
            engine,
            session,
            policy: plan.strategy.create_policy(seed),
            plan,
            summary,
            seen_ids: HashSet::new(),
        })
    }

    /// Run the plan to completion and return the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a save or reload through storage fails.
    pub fn run(mut self) -> Result<SimulationSummary> {
        let tick_ms = self.plan.tick_ms.max(1);
        let mut now = 0;
        while now <= self.plan.duration_ms {
            self.step_tick(now);
            let decision = self.policy.decide(&self.session);
            if let Some(rationale) = &decision.rationale {
                log::debug!("{now} {}: {rationale}", self.policy.name());
            }
            self.apply(decision.action, now);
            if let Some(every) = self.plan.reload_every_ms
                && now > 0
                && now % every.max(tick_ms) == 0
            {
                self.reload(now)?;
            }
            now += tick_ms;
        }
        self.finish();
        self.engine
            .save_session(&self.session)
            .context("saving final session")?;
        Ok(self.summary)
    }

    fn violation(&mut self, message: String) {
        log::warn!("seed {}: {message}", self.summary.seed);
        self.summary.violations.push(message);
    }

    fn step_tick(&mut self, now: u64) {
        let charges_before = self.session.game().effects.boost_charges();
        let outcome = self.session.tick(now);
        self.summary.ticks += 1;
        self.check_tick(now, charges_before, &outcome);
    }

    fn check_tick(&mut self, now: u64, charges: u32, outcome: &TickOutcome) {
        self.summary.fell_off += u64::try_from(outcome.fell_off.len()).unwrap_or(u64::MAX);
        if outcome.restocked {
            self.summary.restocks += 1;
            self.summary.transcript.push(format!("{now} restock"));
        }
        if let Some(gift) = outcome.spawned {
            self.record_spawn(now, &gift, charges);
            if self.session.modifiers().frozen {
                self.violation(format!("box {} spawned while frozen", gift.id));
            }
        }
        let max_boxes = self.session.config().conveyor.max_boxes;
        if self.session.boxes().len() > max_boxes {
            self.violation(format!(
                "{} boxes on a belt that holds {max_boxes}",
                self.session.boxes().len()
            ));
        }
    }

    fn record_spawn(&mut self, now: u64, gift: &GiftBox, charges_before: u32) {
        self.summary.spawned += 1;
        *self.summary.rarity_counts.entry(gift.rarity).or_insert(0) += 1;
        if charges_before > self.session.game().effects.boost_charges() {
            self.summary.boosted_spawns += 1;
        }
        if !self.seen_ids.insert(gift.id) {
            self.violation(format!("box id {} reused", gift.id));
        }
        let range = self.session.config().economy.cost.get(gift.rarity);
        let (min, max) = (Cents::from_units(range.min), Cents::from_units(range.max));
        if gift.cost < min || gift.cost > max {
            self.violation(format!(
                "{} box {} cost {} outside [{min}, {max}]",
                gift.rarity, gift.id, gift.cost
            ));
        }
        self.summary
            .transcript
            .push(format!("{now} spawn {} {} {}", gift.id, gift.rarity, gift.cost));
    }

    fn apply(&mut self, action: Action, now: u64) {
        match action {
            Action::Wait => {}
            Action::Unbox(id) => self.unbox(id, now),
            Action::Buy(power_up) => self.buy(power_up, now),
            Action::Use(power_up) => self.use_power_up(power_up, now),
        }
    }

    fn unbox(&mut self, id: u64, now: u64) {
        let wallet_before = self.session.wallet().balance();
        let coins_before = self.session.coins();
        let multiplier = self.session.modifiers().reward_multiplier;
        match self.session.unbox(id, now) {
            Ok(outcome) => {
                self.summary.unboxed += 1;
                self.summary.total_cost += outcome.cost;
                self.summary.total_reward += outcome.reward;
                self.summary.coins_earned += outcome.coins;
                let (lo, hi) = self
                    .session
                    .config()
                    .economy
                    .reward_bounds(outcome.cost, outcome.rarity);
                if outcome.reward < lo || outcome.reward > hi {
                    self.violation(format!(
                        "box {id} reward {} outside [{lo}, {hi}]",
                        outcome.reward
                    ));
                }
                if self.session.wallet().balance() != wallet_before - outcome.cost + outcome.reward
                {
                    self.violation(format!("wallet drifted while unboxing {id}"));
                }
                let expected_coins = outcome.reward.scale_floor_whole(multiplier);
                if outcome.coins != expected_coins
                    || self.session.coins() != coins_before + expected_coins
                {
                    self.violation(format!("coin credit for box {id} is wrong"));
                }
                self.summary.transcript.push(format!(
                    "{now} unbox {id} cost {} reward {} coins {}",
                    outcome.cost, outcome.reward, outcome.coins
                ));
            }
            Err(err) => {
                self.summary.refused += 1;
                if self.session.wallet().balance() != wallet_before {
                    self.violation(format!("refused unbox of {id} changed the wallet"));
                }
                self.summary
                    .transcript
                    .push(format!("{now} refused {id}: {err}"));
            }
        }
    }

    fn buy(&mut self, power_up: PowerUp, now: u64) {
        let coins_before = self.session.coins();
        match self.session.buy_power_up(power_up) {
            Ok(_) => {
                self.summary.purchases += 1;
                if self.session.coins() != coins_before - find_item(power_up).price {
                    self.violation(format!("buying {power_up} charged the wrong price"));
                }
                self.summary.transcript.push(format!("{now} buy {power_up}"));
            }
            Err(err) => {
                if self.session.coins() != coins_before {
                    self.violation(format!("failed purchase of {power_up} cost coins"));
                }
                self.summary
                    .transcript
                    .push(format!("{now} buy failed: {err}"));
            }
        }
        let stock = self.session.shop().stock(power_up);
        let cap = find_item(power_up).default_stock;
        if stock > cap {
            self.violation(format!("{power_up} stock {stock} above {cap}"));
        }
    }

    fn use_power_up(&mut self, power_up: PowerUp, now: u64) {
        let owned = self.session.game().inventory.count(power_up);
        let used = self.session.use_power_up(power_up, now);
        if used != (owned > 0) {
            self.violation(format!("using {power_up} with {owned} owned returned {used}"));
        }
        if used {
            self.summary.power_ups_used += 1;
            self.summary.transcript.push(format!("{now} use {power_up}"));
        }
    }

    fn reload(&mut self, now: u64) -> Result<()> {
        self.engine
            .save_session(&self.session)
            .context("saving mid-run session")?;
        let restored = self
            .engine
            .load_session(self.summary.seed, now)
            .context("reloading mid-run session")?;
        if restored.wallet() != self.session.wallet() {
            self.violation(format!("wallet changed across reload at {now}"));
        }
        if restored.coins() != self.session.coins()
            || restored.game().collection != self.session.game().collection
        {
            self.violation(format!("game bucket changed across reload at {now}"));
        }
        if restored.social() != self.session.social() {
            self.violation(format!("social bucket changed across reload at {now}"));
        }
        self.session = restored;
        self.summary.reloads += 1;
        self.summary.transcript.push(format!("{now} reload"));
        Ok(())
    }

    fn finish(&mut self) {
        let wallet = self.session.wallet().balance();
        let coins = self.session.coins();
        if wallet.is_negative() || coins.is_negative() {
            self.violation(format!("negative balance: wallet {wallet}, coins {coins}"));
        }
        self.summary.final_wallet = wallet;
        self.summary.final_coins = coins;
        self.summary.final_profit = self.session.social().profile.total_profit;
        self.summary.collection_size = self.session.game().collection.len();
        if self.summary.final_profit != self.summary.net_profit() {
            self.violation(format!(
                "profile profit {} differs from unbox profit {}",
                self.summary.final_profit,
                self.summary.net_profit()
            ));
        }
    }
}

/// Run one plan against `engine` for `seed`.
///
/// # Errors
///
/// Returns an error if the session cannot be created or persisted.
pub fn run_plan<S: GameStorage>(
    engine: &GameEngine<S>,
    plan: &SimulationPlan,
    seed: u64,
) -> Result<SimulationSummary> {
    SimulationSession::new(engine, plan.clone(), seed)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftstream_game::{EconomyConfig, MemoryStorage};

    fn engine() -> GameEngine<MemoryStorage> {
        GameEngine::new(MemoryStorage::new(), EconomyConfig::default())
    }

    #[test]
    fn strategies_run_without_violations() {
        let engine = engine();
        for strategy in GameplayStrategy::ALL {
            let plan = SimulationPlan::new(strategy).with_duration_ms(60_000);
            let summary = run_plan(&engine, &plan, 0xFEED).unwrap();
            assert!(
                summary.violations.is_empty(),
                "{strategy}: {:?}",
                summary.violations
            );
            assert!(summary.spawned > 0);
            assert_eq!(summary.ticks, 601);
        }
    }

    #[test]
    fn no_wallet_means_no_unboxes() {
        let plan = SimulationPlan::new(GameplayStrategy::Greedy)
            .without_wallet()
            .with_duration_ms(10_000);
        let summary = run_plan(&engine(), &plan, 3).unwrap();
        assert_eq!(summary.unboxed, 0);
        assert_eq!(summary.final_wallet, Cents::ZERO);
    }

    #[test]
    fn reloads_preserve_state() {
        let plan = SimulationPlan::new(GameplayStrategy::PowerUser)
            .with_duration_ms(30_000)
            .with_reload_every_ms(5_000);
        let summary = run_plan(&engine(), &plan, 21).unwrap();
        assert_eq!(summary.reloads, 6);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
    }

    #[test]
    fn setup_runs_before_play() {
        fn stock_up(session: &mut Session) {
            session.buy_power_up(PowerUp::Freeze).unwrap();
        }
        let plan = SimulationPlan::new(GameplayStrategy::Cautious)
            .without_wallet()
            .with_duration_ms(0)
            .with_setup(stock_up);
        let summary = run_plan(&engine(), &plan, 1).unwrap();
        assert_eq!(summary.final_coins, Cents::from_whole(415));
    }

    #[test]
    fn expectations_receive_summary() {
        let plan = SimulationPlan::new(GameplayStrategy::Cautious).with_expectation(
            |summary: &SimulationSummary| {
                anyhow::ensure!(summary.ticks > 0, "no ticks");
                Ok(())
            },
        );
        let summary = run_plan(&engine(), &plan, 1).unwrap();
        for expectation in &plan.expectations {
            expectation.evaluate(&summary).unwrap();
        }
    }
}
