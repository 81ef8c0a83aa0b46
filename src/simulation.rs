//! Randomised load simulation against the dispatch engine.
//!
//! A run provisions a starting pool of bots, plays a random interleaving of
//! hires, retirements and order submissions, waits for in-flight work to
//! finish and reports what happened.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use botline_core::{Error, Result};
use dispatch::{
    Dispatch, DispatchConfig, ExecutorConfig, RealtimeExecutor, SequentialIdSource,
    SharedDispatch,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Everything a run can be configured with, as read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Settings {
    /// Load settings from a TOML file. Missing sections and keys take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileReadFailed` if the file cannot be read,
    /// `Error::TomlParseFailed` if it is not valid TOML for these settings,
    /// and `Error::InvalidConfig` if the values fail validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        let settings: Self =
            toml::from_str(&raw).map_err(|e| Error::toml_parse_failed(e.to_string()))?;
        settings.validate()?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Validate both sections.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if either section is invalid.
    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate()?;
        self.simulation.validate()
    }
}

/// Shape of the random workload.
///
/// Each budget is drawn uniformly from `1..=max_*` at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Bots hired before the random calls start.
    #[serde(default = "default_initial_bots")]
    pub initial_bots: usize,

    #[serde(default = "default_max_hires")]
    pub max_hires: usize,

    #[serde(default = "default_max_retires")]
    pub max_retires: usize,

    #[serde(default = "default_max_normal_orders")]
    pub max_normal_orders: usize,

    #[serde(default = "default_max_vip_orders")]
    pub max_vip_orders: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationConfig {
    /// Create a simulation config with defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_bots: 5,
            max_hires: 10,
            max_retires: 10,
            max_normal_orders: 15,
            max_vip_orders: 15,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if any budget upper bound is zero.
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("max_hires", self.max_hires),
            ("max_retires", self.max_retires),
            ("max_normal_orders", self.max_normal_orders),
            ("max_vip_orders", self.max_vip_orders),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, max)| *max == 0) {
            return Err(Error::invalid_config(format!(
                "{name} must be greater than 0"
            )));
        }

        Ok(())
    }
}

const fn default_initial_bots() -> usize {
    5
}

const fn default_max_hires() -> usize {
    10
}

const fn default_max_retires() -> usize {
    10
}

const fn default_max_normal_orders() -> usize {
    15
}

const fn default_max_vip_orders() -> usize {
    15
}

/// One call made against the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hire,
    Retire,
    SubmitNormal,
    SubmitVip,
}

/// A fixed sequence of calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    /// Draw call budgets and interleave them at random.
    ///
    /// At each step one action is picked uniformly among those whose budget
    /// is not yet spent.
    pub fn random<R: Rng>(config: &SimulationConfig, rng: &mut R) -> Self {
        let mut budgets = vec![
            (Action::Hire, rng.gen_range(1..=config.max_hires.max(1))),
            (Action::Retire, rng.gen_range(1..=config.max_retires.max(1))),
            (
                Action::SubmitNormal,
                rng.gen_range(1..=config.max_normal_orders.max(1)),
            ),
            (
                Action::SubmitVip,
                rng.gen_range(1..=config.max_vip_orders.max(1)),
            ),
        ];
        debug!(?budgets, "Drew call budgets");

        let total = budgets.iter().map(|(_, n)| n).sum::<usize>();
        let mut actions = Vec::with_capacity(total);
        while let Some(slot) = budgets.choose_mut(rng) {
            actions.push(slot.0);
            slot.1 = slot.1.saturating_sub(1);
            budgets.retain(|(_, remaining)| *remaining > 0);
        }

        Self { actions }
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of calls of the given kind.
    #[must_use]
    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|a| **a == action).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl From<Vec<Action>> for Plan {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

/// Play `plan` against `dispatch`.
///
/// Returns how many retirements actually removed a bot.
///
/// # Errors
///
/// Returns an error if the engine rejects a submission.
pub fn apply(dispatch: &mut Dispatch, plan: &Plan) -> Result<usize> {
    let mut retired = 0usize;
    for action in plan.actions() {
        match action {
            Action::Hire => {
                dispatch.hire();
            }
            Action::Retire => {
                if dispatch.retire().is_some() {
                    retired = retired.saturating_add(1);
                } else {
                    debug!("No bot to retire");
                }
            }
            Action::SubmitNormal => {
                dispatch.submit_normal(None)?;
            }
            Action::SubmitVip => {
                dispatch.submit_vip(None)?;
            }
        }
    }
    Ok(retired)
}

/// End-of-run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub bots_remaining: usize,
    pub bots_deleted: usize,
    pub normal_completed: usize,
    pub vip_completed: usize,
}

impl Summary {
    /// Read the final counts off the engine.
    #[must_use]
    pub fn collect(dispatch: &Dispatch, bots_deleted: usize) -> Self {
        let completed = dispatch.completed_orders();
        let vip_completed = completed.iter().filter(|o| o.is_vip()).count();
        Self {
            bots_remaining: dispatch.bot_count(),
            bots_deleted,
            normal_completed: completed.len().saturating_sub(vip_completed),
            vip_completed,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SUMMARY")?;
        writeln!(f, "=======")?;
        writeln!(f, "Total Bots Remaining: {}", self.bots_remaining)?;
        writeln!(f, "Total Bots (Deleted): {}", self.bots_deleted)?;
        writeln!(f, "Total Normal Orders Completed: {}", self.normal_completed)?;
        write!(f, "Total VIP Orders Completed: {}", self.vip_completed)
    }
}

/// How a run waits for in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Drain {
    /// Let completions fire as wall-clock time passes.
    #[default]
    Realtime,
    /// Jump the virtual clock straight to the last completion.
    Instant,
}

/// Execute one full simulation.
///
/// A `seed` fixes both the plan and the bot ids, so two seeded runs with the
/// same settings produce the same summary.
///
/// # Errors
///
/// Returns `Error::InvalidConfig` if `settings` fail validation, or the
/// engine error if a submission is rejected.
pub async fn run(settings: &Settings, seed: Option<u64>, drain: Drain) -> Result<Summary> {
    settings.validate()?;

    let (mut rng, dispatch) = match seed {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            Dispatch::with_id_source(
                settings.dispatch.clone(),
                Box::new(SequentialIdSource::new()),
            )?,
        ),
        None => (StdRng::from_entropy(), Dispatch::new(settings.dispatch.clone())?),
    };
    let dispatch: SharedDispatch = Arc::new(Mutex::new(dispatch));

    let plan = Plan::random(&settings.simulation, &mut rng);
    info!(
        seed = ?seed,
        initial_bots = settings.simulation.initial_bots,
        calls = plan.len(),
        "Starting order management simulation"
    );

    let retired = {
        let mut dispatch = dispatch.lock().await;
        for _ in 0..settings.simulation.initial_bots {
            dispatch.hire();
        }
        apply(&mut dispatch, &plan)?
    };

    match drain {
        Drain::Instant => {
            let completed = dispatch.lock().await.run_until_idle();
            debug!(completed = completed.len(), "Drained virtual clock");
        }
        Drain::Realtime => {
            let executor = RealtimeExecutor::new(ExecutorConfig::default(), Arc::clone(&dispatch));
            executor.drain().await;
        }
    }

    let dispatch = dispatch.lock().await;
    let summary = Summary::collect(&dispatch, retired);
    info!(
        bots_remaining = summary.bots_remaining,
        bots_deleted = summary.bots_deleted,
        normal_completed = summary.normal_completed,
        vip_completed = summary.vip_completed,
        at = ?dispatch.now(),
        "Simulation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.initial_bots, 5);
        assert_eq!(config.max_hires, 10);
        assert_eq!(config.max_vip_orders, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_bound_rejected() {
        let config = SimulationConfig {
            max_retires: 0,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_retires"));
    }

    #[test]
    fn test_plan_respects_budget_bounds() {
        let config = SimulationConfig::default();
        for seed in 0..50 {
            let plan = Plan::random(&config, &mut seeded(seed));
            assert!((1..=10).contains(&plan.count(Action::Hire)));
            assert!((1..=10).contains(&plan.count(Action::Retire)));
            assert!((1..=15).contains(&plan.count(Action::SubmitNormal)));
            assert!((1..=15).contains(&plan.count(Action::SubmitVip)));
        }
    }

    #[test]
    fn test_plan_is_reproducible_from_seed() {
        let config = SimulationConfig::default();
        let a = Plan::random(&config, &mut seeded(7));
        let b = Plan::random(&config, &mut seeded(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_bounds_give_one_call_each() {
        let config = SimulationConfig {
            initial_bots: 0,
            max_hires: 1,
            max_retires: 1,
            max_normal_orders: 1,
            max_vip_orders: 1,
        };
        let plan = Plan::random(&config, &mut seeded(3));
        assert_eq!(plan.len(), 4);
        for action in [
            Action::Hire,
            Action::Retire,
            Action::SubmitNormal,
            Action::SubmitVip,
        ] {
            assert_eq!(plan.count(action), 1);
        }
    }

    #[test]
    fn test_apply_counts_only_real_retirements() {
        let mut dispatch = Dispatch::new(DispatchConfig::default()).unwrap();
        let plan = Plan::from(vec![
            Action::Retire,
            Action::Hire,
            Action::SubmitVip,
            Action::Retire,
            Action::Retire,
        ]);

        assert_eq!(apply(&mut dispatch, &plan).unwrap(), 1);
        assert_eq!(dispatch.bot_count(), 0);
        assert_eq!(dispatch.pending_orders().len(), 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            bots_remaining: 3,
            bots_deleted: 4,
            normal_completed: 9,
            vip_completed: 2,
        };
        assert_eq!(
            summary.to_string(),
            "SUMMARY\n=======\n\
             Total Bots Remaining: 3\n\
             Total Bots (Deleted): 4\n\
             Total Normal Orders Completed: 9\n\
             Total VIP Orders Completed: 2"
        );
    }

    #[test]
    fn test_summary_splits_by_class() {
        let mut dispatch = Dispatch::new(DispatchConfig::default()).unwrap();
        dispatch.hire();
        dispatch.submit_normal(None).unwrap();
        dispatch.submit_vip(None).unwrap();
        dispatch.submit_normal(None).unwrap();
        dispatch.run_until_idle();

        let summary = Summary::collect(&dispatch, 0);
        assert_eq!(summary.normal_completed, 2);
        assert_eq!(summary.vip_completed, 1);
        assert_eq!(summary.bots_remaining, 1);
    }
}
