//! Closed-form estimates over the static drop table.
//!
//! Every estimate assumes independence across levels and across runs,
//! which holds by construction of the roll engine.

use crate::{config::DropTable, types::{ItemId, Level}};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedRuns {
    Runs(u64),
    /// The item cannot drop at any level of the run.
    Unbounded,
}

impl fmt::Display for ExpectedRuns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runs(n) => write!(f, "{n}"),
            Self::Unbounded => write!(f, "never"),
        }
    }
}

fn denominators<'a>(
    table: &'a DropTable,
    item_id: &str,
    max_level: Level,
) -> impl Iterator<Item = f64> + 'a {
    let item_id = item_id.to_string();
    (1..=max_level).filter_map(move |level| table.drop_rate(&item_id, level).map(f64::from))
}

/// Chance of seeing `item_id` at least once in `runs` runs to `max_level`.
pub fn probability_of_at_least_one(
    table: &DropTable,
    item_id: &str,
    max_level: Level,
    runs: u64,
) -> f64 {
    let miss_per_run: f64 = denominators(table, item_id, max_level)
        .map(|d| 1.0 - 1.0 / d)
        .product();

    (1.0 - miss_per_run.powf(runs as f64)).clamp(0.0, 1.0)
}

/// Chance of at least one `item_id` in a single run, combined level by level.
pub fn per_run_drop_chance(table: &DropTable, item_id: &str, max_level: Level) -> f64 {
    denominators(table, item_id, max_level).fold(0.0, |combined, d| combined + (1.0 / d) * (1.0 - combined))
}

/// Rounded mean number of runs before the first `item_id`.
pub fn expected_runs_to_first_drop(table: &DropTable, item_id: &str, max_level: Level) -> ExpectedRuns {
    let combined = per_run_drop_chance(table, item_id, max_level);
    if combined == 0.0 {
        return ExpectedRuns::Unbounded;
    }
    ExpectedRuns::Runs((1.0 / combined).round() as u64)
}

/// Mean number of `item_id` drops per run (a run can drop it more than once).
pub fn expected_drops_per_run(table: &DropTable, item_id: &str, max_level: Level) -> f64 {
    denominators(table, item_id, max_level).map(|d| 1.0 / d).sum()
}

/// Mean value of a single run: guaranteed currency plus the expected
/// value of every unique.
pub fn expected_value_per_run(table: &DropTable, max_level: Level) -> f64 {
    let currency_value = (table.currency_for_run(max_level) * table.currency.unit_price) as f64;
    let unique_value: f64 = table
        .items
        .iter()
        .map(|item| item.price as f64 * expected_drops_per_run(table, &item.id, max_level))
        .sum();
    currency_value + unique_value
}

/// Every per-item estimate for one (item, max level, run count) query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemEstimate {
    pub item_id:            ItemId,
    pub item_name:          String,
    pub max_level:          Level,
    pub runs:               u64,
    pub per_run_chance:     f64,
    pub probability:        f64,
    pub expected_runs:      ExpectedRuns,
    pub expected_drops:     f64,
}

pub fn estimate_item(table: &DropTable, item_id: &str, max_level: Level, runs: u64) -> ItemEstimate {
    ItemEstimate {
        item_id:        item_id.to_string(),
        item_name:      table.display_name(item_id),
        max_level,
        runs,
        per_run_chance: per_run_drop_chance(table, item_id, max_level),
        probability:    probability_of_at_least_one(table, item_id, max_level, runs),
        expected_runs:  expected_runs_to_first_drop(table, item_id, max_level),
        expected_drops: expected_drops_per_run(table, item_id, max_level) * runs as f64,
    }
}
