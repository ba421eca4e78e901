//! The run orchestrator.
//!
//! PHASES: Idle → Running → (Cancelling) → Idle.
//!
//! RULES:
//!   - Only the run loop mutates the store.
//!   - A start request while not Idle is a logged no-op.
//!   - Cancellation is checked once per run and wakes any inter-run wait.
//!   - The engine always returns to Idle, even on early exit.
//!   - All randomness flows through the RngBank.

use crate::{
    assets::{AssetResolver, DEFAULT_IMAGE_BASE},
    clock::{pause_after, Pause},
    config::DropTable,
    control::{Phase, RunGuard, StopHandle},
    error::{SimError, SimResult},
    estimator::{estimate_item, ItemEstimate},
    event::SimEvent,
    rng::RngBank,
    roll::simulate_run,
    settings::{SettingsUpdate, SimSettings},
    snapshot::{capture, EngineView, RunSummary, SimSnapshot},
    store::LootStore,
    types::Level,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub completed: u64,
    pub cancelled: bool,
    /// The request was refused because a simulation was already active.
    pub skipped:   bool,
}

pub struct SimEngine {
    table:       DropTable,
    settings:    SimSettings,
    seed:        u64,
    rng_bank:    RngBank,
    store:       LootStore,
    assets:      AssetResolver,
    control:     StopHandle,
    current_run: u64,
}

impl SimEngine {
    pub fn new(table: DropTable, settings: SimSettings) -> SimResult<Self> {
        table.validate()?;
        settings.validate()?;

        let seed = settings.resolve_seed();
        log::info!(
            "Engine ready: seed={seed} max_level={} speed={} items={}",
            settings.max_level,
            settings.speed,
            table.items.len()
        );

        Ok(Self {
            store:       LootStore::new(&table),
            assets:      AssetResolver::from_table(&table, DEFAULT_IMAGE_BASE),
            rng_bank:    RngBank::new(seed),
            seed,
            current_run: 0,
            control:     StopHandle::new(),
            settings,
            table,
        })
    }

    /// Engine over the built-in drop table.
    pub fn build(settings: SimSettings) -> SimResult<Self> {
        Self::new(DropTable::builtin(), settings)
    }

    /// Point image paths at a different asset root.
    pub fn with_image_base(mut self, base: &str) -> Self {
        self.assets = AssetResolver::from_table(&self.table, base);
        self
    }

    pub fn table(&self) -> &DropTable { &self.table }
    pub fn settings(&self) -> &SimSettings { &self.settings }
    pub fn store(&self) -> &LootStore { &self.store }
    pub fn assets(&self) -> &AssetResolver { &self.assets }
    pub fn seed(&self) -> u64 { self.seed }
    pub fn current_run(&self) -> u64 { self.current_run }
    pub fn phase(&self) -> Phase { self.control.phase() }

    pub fn is_running(&self) -> bool {
        self.phase() != Phase::Idle
    }

    /// A handle that can stop this engine from a listener or another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    /// Raise cancellation. No-op unless running.
    pub fn stop(&self) -> bool {
        let raised = self.control.stop();
        if raised {
            log::info!("Stop requested at run {}", self.current_run);
        }
        raised
    }

    /// Apply a settings change. A new seed re-seeds every following run.
    pub fn apply_settings(&mut self, update: &SettingsUpdate) -> SimResult<()> {
        self.settings.apply(update)?;
        if let Some(seed) = update.seed {
            self.seed = seed;
            self.rng_bank = RngBank::new(seed);
        }
        log::debug!("Settings updated: {:?}", self.settings);
        Ok(())
    }

    /// Clear every counter, streak and history entry.
    pub fn reset(&mut self) -> SimResult<()> {
        if self.is_running() {
            log::warn!("Reset rejected: a simulation is active");
            return Err(SimError::SimulationActive);
        }
        self.store.reset();
        self.current_run = 0;
        log::info!("Store reset");
        Ok(())
    }

    pub fn run(&mut self, count: Option<u64>) -> RunOutcome {
        self.run_with(count, |_, _| {})
    }

    /// Run a simulation, reporting progress to `listener` after every run.
    pub fn run_with<F>(&mut self, count: Option<u64>, mut listener: F) -> RunOutcome
    where
        F: FnMut(&SimEvent, &LootStore),
    {
        if !self.control.try_begin() {
            log::warn!("Simulation already active; start request ignored");
            listener(&SimEvent::SimulationRejected, &self.store);
            return RunOutcome { skipped: true, ..Default::default() };
        }

        let control = self.control.clone();
        let guard = RunGuard::new(&control);

        let total = self.settings.runs_for(count);
        log::info!(
            "Simulation started: {total} runs to level {} at {} speed",
            self.settings.max_level,
            self.settings.speed
        );
        listener(
            &SimEvent::SimulationStarted {
                planned_runs: total,
                max_level:    self.settings.max_level,
                speed:        self.settings.speed,
                seed:         self.seed,
            },
            &self.store,
        );

        let completed = self.run_loop(total, &mut listener);
        let cancelled = completed < total && control.is_cancelled();

        self.current_run = 0;
        drop(guard);

        log::info!("Simulation finished: {completed}/{total} runs, cancelled={cancelled}");
        listener(&SimEvent::SimulationFinished { completed, cancelled }, &self.store);

        RunOutcome { completed, cancelled, skipped: false }
    }

    fn run_loop<F>(&mut self, total: u64, listener: &mut F) -> u64
    where
        F: FnMut(&SimEvent, &LootStore),
    {
        let delay = self.settings.speed.delay();
        let max_level = self.settings.max_level;
        let mut completed = 0;

        for index in 1..=total {
            if self.control.is_cancelled() {
                break;
            }

            self.current_run = index;
            let run_number = self.store.total_runs() + 1;
            let result = simulate_run(&self.table, max_level, run_number, &self.rng_bank);
            let event = SimEvent::RunCompleted { index, run: RunSummary::from(&result) };

            self.store.add_run_result(result);
            completed += 1;
            listener(&event, &self.store);

            match pause_after(delay, index, total) {
                Pause::Wait(d) => {
                    if self.control.wait(d) {
                        log::debug!("Inter-run wait interrupted after run {index}");
                    }
                }
                Pause::Yield => std::thread::yield_now(),
                Pause::None => {}
            }
        }
        completed
    }

    pub fn snapshot(&self) -> SimSnapshot {
        let view = EngineView {
            phase:       self.phase(),
            current_run: self.current_run,
            seed:        self.seed,
            settings:    &self.settings,
        };
        capture(view, &self.table, &self.store, &self.assets)
    }

    /// Estimates for one item; defaults to the configured level and run count.
    pub fn estimate(&self, item_id: &str, max_level: Option<Level>, runs: Option<u64>) -> ItemEstimate {
        estimate_item(
            &self.table,
            item_id,
            max_level.unwrap_or(self.settings.max_level),
            runs.unwrap_or(self.settings.runs_to_simulate),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimSpeed;

    fn instant_engine(seed: u64) -> SimEngine {
        let settings = SimSettings {
            speed: SimSpeed::Instant,
            seed: Some(seed),
            ..Default::default()
        };
        SimEngine::build(settings).expect("engine builds")
    }

    #[test]
    fn reentrant_start_is_a_noop() {
        let mut engine = instant_engine(1);
        assert!(engine.control.try_begin());

        let mut rejected = false;
        let outcome = engine.run_with(Some(10), |event, _| {
            rejected |= *event == SimEvent::SimulationRejected;
        });

        assert!(outcome.skipped);
        assert!(rejected);
        assert_eq!(engine.store().total_runs(), 0);
        assert_eq!(engine.phase(), Phase::Running);
        engine.control.finish();
    }

    #[test]
    fn reset_is_rejected_while_active() {
        let mut engine = instant_engine(2);
        engine.run(Some(5));
        assert!(engine.control.try_begin());
        assert!(matches!(engine.reset(), Err(SimError::SimulationActive)));
        assert_eq!(engine.store().total_runs(), 5);
        engine.control.finish();
        engine.reset().expect("reset once idle");
        assert_eq!(engine.store().total_runs(), 0);
    }

    #[test]
    fn current_run_tracks_loop_and_clears_after() {
        let mut engine = instant_engine(3);
        let handle = engine.stop_handle();
        let mut phases = Vec::new();
        engine.run_with(Some(3), |event, _| {
            if let SimEvent::RunCompleted { .. } = event {
                phases.push(handle.phase());
            }
        });
        assert_eq!(phases, vec![Phase::Running; 3]);
        assert_eq!(engine.current_run(), 0);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn new_seed_reseeds_following_runs() {
        let mut a = instant_engine(10);
        let mut b = instant_engine(11);
        b.apply_settings(&SettingsUpdate { seed: Some(10), ..Default::default() })
            .expect("seed update");
        a.run(Some(50));
        b.run(Some(50));
        assert_eq!(a.store().history(), b.store().history());
    }

    #[test]
    fn invalid_settings_are_rejected_at_build() {
        let settings = SimSettings { max_level: 0, ..Default::default() };
        assert!(matches!(
            SimEngine::build(settings),
            Err(SimError::InvalidMaxLevel { max_level: 0 })
        ));
    }
}
