use anyhow::{Result, ensure};
use giftstream_game::{Cents, EconomyConfig, GameEngine, MemoryStorage, PowerUp, Session};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary, run_plan};

const LONG_SESSION_MS: u64 = 600_000;
const RELOAD_INTERVAL_MS: u64 = 15_000;

/// A named simulation plan the tester can run against many seeds.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(key: &'static str, name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            key,
            name: name.into(),
            plan,
        }
    }
}

fn activity_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.spawned > 0, "conveyor never spawned a box");
    ensure!(
        summary.unboxed > 0,
        "no box was unboxed in {} ticks",
        summary.ticks
    );
    Ok(())
}

fn ledger_expectation(summary: &SimulationSummary) -> Result<()> {
    let expected = summary.starting_wallet + summary.total_reward - summary.total_cost;
    ensure!(
        summary.final_wallet == expected,
        "wallet {} differs from starting balance plus rewards minus costs {expected}",
        summary.final_wallet
    );
    ensure!(
        summary.collection_size == usize::try_from(summary.unboxed).unwrap_or(usize::MAX),
        "collection holds {} items after {} unboxes",
        summary.collection_size,
        summary.unboxed
    );
    Ok(())
}

fn restock_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.restocks >= 2,
        "expected periodic restocks, saw {}",
        summary.restocks
    );
    Ok(())
}

fn power_up_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.power_ups_used > 0,
        "power-user strategy never used a power-up"
    );
    Ok(())
}

fn reload_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.reloads > 0, "session was never reloaded");
    Ok(())
}

fn idle_wallet_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.unboxed == 0,
        "unboxed {} boxes with no wallet",
        summary.unboxed
    );
    ensure!(
        summary.final_wallet == Cents::ZERO,
        "disconnected wallet holds {}",
        summary.final_wallet
    );
    ensure!(summary.fell_off > 0, "untouched boxes never fell off");
    Ok(())
}

fn determinism_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::MonteCarlo).with_duration_ms(60_000)
}

fn determinism_expectation(summary: &SimulationSummary) -> Result<()> {
    let engine = GameEngine::new(MemoryStorage::new(), EconomyConfig::default());
    let replay = run_plan(&engine, &determinism_plan(), summary.seed)?;
    ensure!(
        replay.transcript == summary.transcript,
        "replay of seed {} diverged after {} of {} events",
        summary.seed,
        replay
            .transcript
            .iter()
            .zip(&summary.transcript)
            .take_while(|(a, b)| a == b)
            .count(),
        summary.transcript.len()
    );
    ensure!(
        replay.final_wallet == summary.final_wallet && replay.final_coins == summary.final_coins,
        "replay of seed {} ended with different balances",
        summary.seed
    );
    Ok(())
}

fn stock_power_ups(session: &mut Session) {
    for power_up in [PowerUp::SlowMo, PowerUp::Freeze] {
        if let Err(err) = session.buy_power_up(power_up) {
            log::warn!("setup could not buy {power_up}: {err}");
        }
    }
}

fn strategy_scenario(
    key: &'static str,
    name: &str,
    strategy: GameplayStrategy,
) -> TestScenario {
    TestScenario::simulation(
        key,
        name,
        SimulationPlan::new(strategy)
            .with_expectation(activity_expectation)
            .with_expectation(ledger_expectation),
    )
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::simulation(
            "smoke",
            "Smoke Test",
            SimulationPlan::new(GameplayStrategy::Greedy)
                .with_duration_ms(30_000)
                .with_expectation(activity_expectation),
        ),
        "cautious" | "cautious-strategy" => {
            strategy_scenario("cautious", "Cautious Strategy", GameplayStrategy::Cautious)
        }
        "greedy" | "greedy-strategy" => {
            strategy_scenario("greedy", "Greedy Strategy", GameplayStrategy::Greedy)
        }
        "power-user" | "power" => TestScenario::simulation(
            "power-user",
            "Power User Strategy",
            SimulationPlan::new(GameplayStrategy::PowerUser)
                .with_setup(stock_power_ups)
                .with_expectation(power_up_expectation)
                .with_expectation(ledger_expectation),
        ),
        "monte-carlo" | "random" => strategy_scenario(
            "monte-carlo",
            "Monte Carlo Strategy",
            GameplayStrategy::MonteCarlo,
        ),
        "persistence" | "reload" => TestScenario::simulation(
            "persistence",
            "Save and Reload",
            SimulationPlan::new(GameplayStrategy::Greedy)
                .with_reload_every_ms(RELOAD_INTERVAL_MS)
                .with_expectation(reload_expectation)
                .with_expectation(ledger_expectation),
        ),
        "determinism" | "deterministic" => TestScenario::simulation(
            "determinism",
            "Deterministic Replay",
            determinism_plan().with_expectation(determinism_expectation),
        ),
        "no-wallet" | "idle" => TestScenario::simulation(
            "no-wallet",
            "Disconnected Wallet",
            SimulationPlan::new(GameplayStrategy::Greedy)
                .without_wallet()
                .with_duration_ms(60_000)
                .with_expectation(idle_wallet_expectation),
        ),
        "long-session" | "long" => TestScenario::simulation(
            "long-session",
            "Long Session",
            SimulationPlan::new(GameplayStrategy::MonteCarlo)
                .with_duration_ms(LONG_SESSION_MS)
                .with_expectation(restock_expectation)
                .with_expectation(ledger_expectation),
        ),
        _ => return None,
    };
    Some(scenario)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("cautious", "Cautious Strategy"),
        ("greedy", "Greedy Strategy"),
        ("power-user", "Power User Strategy"),
        ("monte-carlo", "Monte Carlo Strategy"),
        ("persistence", "Save and Reload"),
        ("determinism", "Deterministic Replay"),
        ("no-wallet", "Disconnected Wallet"),
        ("long-session", "Long Session"),
    ]
}

/// Expand `all` into every listed scenario key.
#[must_use]
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = requested.iter().filter(|s| *s != "all").cloned().collect();
    if requested.iter().any(|s| s == "all") {
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}
