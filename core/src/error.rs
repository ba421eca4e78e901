use crate::types::{ItemId, Level};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Drop table has no entry for level {level}")]
    MissingLevel { level: Level },

    #[error("Drop table defines level {level} more than once")]
    DuplicateLevel { level: Level },

    #[error("Drop table level {level} is above the level cap {cap}")]
    LevelAboveCap { level: Level, cap: Level },

    #[error("Item '{item_id}' has a zero denominator at level {level}")]
    ZeroDenominator { item_id: ItemId, level: Level },

    #[error("Item '{item_id}' is defined more than once")]
    DuplicateItem { item_id: ItemId },

    #[error("Common loot '{item_id}' has min quantity {min} above max {max}")]
    InvalidQuantityRange { item_id: ItemId, min: u32, max: u32 },

    #[error("Max level must be at least 1, got {max_level}")]
    InvalidMaxLevel { max_level: Level },

    #[error("A simulation is already running")]
    SimulationActive,
}

pub type SimResult<T> = Result<T, SimError>;
