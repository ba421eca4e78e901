//! User-adjustable simulation settings.

use crate::{
    clock::SimSpeed,
    error::{SimError, SimResult},
    types::{Level, LEVEL_CAP},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunCountMode {
    /// Every simulation runs `runs_to_simulate` times, whatever was requested.
    Fixed,
    /// A simulation may request its own count; `runs_to_simulate` is the fallback.
    #[default]
    PerSimulation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimSettings {
    pub max_level:        Level,
    pub runs_to_simulate: u64,
    pub speed:            SimSpeed,
    pub run_count_mode:   RunCountMode,
    /// Master seed. `None` draws a fresh one when the engine is built.
    pub seed:             Option<u64>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            max_level:        LEVEL_CAP,
            runs_to_simulate: 100,
            speed:            SimSpeed::Fast,
            run_count_mode:   RunCountMode::PerSimulation,
            seed:             None,
        }
    }
}

impl SimSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.max_level == 0 {
            return Err(SimError::InvalidMaxLevel { max_level: self.max_level });
        }
        Ok(())
    }

    /// How many runs a simulation performs for a requested count.
    pub fn runs_for(&self, requested: Option<u64>) -> u64 {
        match self.run_count_mode {
            RunCountMode::Fixed => self.runs_to_simulate,
            RunCountMode::PerSimulation => requested.unwrap_or(self.runs_to_simulate),
        }
    }

    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Apply a partial update, rejecting it whole if the result is invalid.
    pub fn apply(&mut self, update: &SettingsUpdate) -> SimResult<()> {
        let mut next = self.clone();
        if let Some(max_level) = update.max_level {
            next.max_level = max_level;
        }
        if let Some(runs) = update.runs_to_simulate {
            next.runs_to_simulate = runs;
        }
        if let Some(speed) = update.speed {
            next.speed = speed;
        }
        if let Some(mode) = update.run_count_mode {
            next.run_count_mode = mode;
        }
        if let Some(seed) = update.seed {
            next.seed = Some(seed);
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// A partial settings change; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsUpdate {
    pub max_level:        Option<Level>,
    pub runs_to_simulate: Option<u64>,
    pub speed:            Option<SimSpeed>,
    pub run_count_mode:   Option<RunCountMode>,
    pub seed:             Option<u64>,
}
