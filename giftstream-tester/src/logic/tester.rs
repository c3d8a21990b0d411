use anyhow::Result;
use colored::Colorize;
use giftstream_game::{Cents, EconomyConfig, GameEngine, MemoryStorage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::common::storage::FileStorage;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{SimulationPlan, SimulationSummary, run_plan};

/// Per-iteration numbers kept for CSV and JSON reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub scenario: String,
    pub strategy: String,
    pub seed: u64,
    pub spawned: u64,
    pub unboxed: u64,
    pub refused: u64,
    pub purchases: u64,
    pub power_ups_used: u64,
    pub net_profit: Cents,
    pub final_wallet: Cents,
    pub final_coins: Cents,
    pub violations: usize,
}

impl RunRecord {
    fn from_summary(scenario: &str, summary: &SimulationSummary) -> Self {
        Self {
            scenario: scenario.to_string(),
            strategy: summary
                .strategy
                .map_or_else(|| "-".to_string(), |s| s.label().to_string()),
            seed: summary.seed,
            spawned: summary.spawned,
            unboxed: summary.unboxed,
            refused: summary.refused,
            purchases: summary.purchases,
            power_ups_used: summary.power_ups_used,
            net_profit: summary.net_profit(),
            final_wallet: summary.final_wallet,
            final_coins: summary.final_coins,
            violations: summary.violations.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
    pub runs: Vec<RunRecord>,
}

pub struct LogicTester {
    config: EconomyConfig,
    state_dir: Option<PathBuf>,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(config: EconomyConfig, state_dir: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            config,
            state_dir,
            verbose,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed.label()
                );
            }

            results.push(self.run_single_scenario(scenario, seed.seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut runs = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.run_iteration(scenario, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1));
                    continue;
                }
            };
            runs.push(RunRecord::from_summary(&scenario.name, &summary));

            if let Some(err) = evaluate_expectations(&scenario.plan, &summary) {
                failures.push(format!(
                    "Iteration {} (strategy {}, seed {}, unboxed {}, refused {}): {} | wallet {} coins {}",
                    i + 1,
                    scenario.plan.strategy,
                    summary.seed,
                    summary.unboxed,
                    summary.refused,
                    err,
                    summary.final_wallet,
                    summary.final_coins
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) unboxed:{} profit:{} strategy:{}",
                        i + 1,
                        iterations,
                        summary.unboxed,
                        summary.net_profit(),
                        scenario.plan.strategy
                    );
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
            runs,
        }
    }

    fn run_iteration(&self, scenario: &TestScenario, seed: u64) -> Result<SimulationSummary> {
        match &self.state_dir {
            Some(dir) => {
                let storage = FileStorage::create(dir.join(format!("{}-{seed}", scenario.key)))?;
                let engine = GameEngine::new(storage, self.config.clone());
                run_plan(&engine, &scenario.plan, seed)
            }
            None => {
                let engine = GameEngine::new(MemoryStorage::new(), self.config.clone());
                run_plan(&engine, &scenario.plan, seed)
            }
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if !summary.violations.is_empty() {
        return Some(format!(
            "{} invariant violations, first: {}",
            summary.violations.len(),
            summary.violations[0]
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
