//! Shared primitive types used across the entire simulator.

/// A delve level. Level 1 is the first floor of a run.
pub type Level = u32;

/// One-based index of a simulated run within a session.
pub type RunNumber = u64;

/// A stable item identifier, e.g. `"cloth"` or `"gold_ore"`.
pub type ItemId = String;

/// Levels above this collapse onto the cap's odds and currency yield.
pub const LEVEL_CAP: Level = 9;

/// Maximum number of run results kept in history.
pub const HISTORY_CAP: usize = 500;

/// Collapse a level onto the drop table. Never extrapolates past the cap.
pub fn normalize_level(level: Level) -> Level {
    level.min(LEVEL_CAP)
}
