//! Events the engine reports to its listener while a simulation runs.

use crate::{
    clock::SimSpeed,
    snapshot::RunSummary,
    types::Level,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    SimulationStarted {
        planned_runs: u64,
        max_level:    Level,
        speed:        SimSpeed,
        seed:         u64,
    },
    RunCompleted {
        /// Position within this simulation, starting at 1.
        index: u64,
        run:   RunSummary,
    },
    SimulationFinished {
        completed: u64,
        cancelled: bool,
    },
    /// A start request arrived while a simulation was active.
    SimulationRejected,
}

impl SimEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SimulationStarted { .. }  => "simulation_started",
            Self::RunCompleted { .. }       => "run_completed",
            Self::SimulationFinished { .. } => "simulation_finished",
            Self::SimulationRejected        => "simulation_rejected",
        }
    }
}
