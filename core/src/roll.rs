//! Roll engine: one Bernoulli trial per (level, item) pair plus
//! guaranteed currency accrual.
//!
//! Drop order inside a run is (level ascending, item table order).

use crate::{
    common_loot::{roll_common_loot, LootItem},
    config::DropTable,
    rng::{RngBank, RollRng, StreamSlot},
    types::{ItemId, Level, RunNumber},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LootDrop {
    pub item_id:    ItemId,
    pub item_name:  String,
    /// The level the trial ran at, before normalization.
    pub level:      Level,
    pub run_number: RunNumber,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunResult {
    pub run_number:   RunNumber,
    pub max_level:    Level,
    pub currency:     u64,
    pub unique_drops: Vec<LootDrop>,
    pub common_loot:  Vec<LootItem>,
    /// Currency value plus the price of every unique dropped.
    pub total_value:  u64,
}

impl RunResult {
    pub fn has_unique(&self) -> bool {
        !self.unique_drops.is_empty()
    }
}

/// Roll one item at one level. Returns `None` without drawing when the
/// item has no odds at that level.
pub fn roll_for_unique(
    table: &DropTable,
    item_id: &str,
    level: Level,
    run_number: RunNumber,
    rng: &mut RollRng,
) -> Option<LootDrop> {
    let denominator = table.drop_rate(item_id, level)?;

    if !rng.chance(1.0 / f64::from(denominator)) {
        return None;
    }

    Some(LootDrop {
        item_id: item_id.to_string(),
        item_name: table.display_name(item_id),
        level,
        run_number,
    })
}

/// Simulate a single delve from level 1 through `max_level`.
pub fn simulate_run(
    table: &DropTable,
    max_level: Level,
    run_number: RunNumber,
    rng_bank: &RngBank,
) -> RunResult {
    let mut rng = rng_bank.for_run(StreamSlot::UniqueRolls, run_number);
    let mut unique_drops = Vec::new();
    let mut currency = 0u64;

    for level in 1..=max_level {
        currency += table.currency_at(level);

        for item in &table.items {
            if let Some(drop) = roll_for_unique(table, &item.id, level, run_number, &mut rng) {
                log::debug!(
                    "run={run_number} level={level} unique drop: {} (1/{})",
                    drop.item_name,
                    table.drop_rate(&item.id, level).unwrap_or_default()
                );
                unique_drops.push(drop);
            }
        }
    }

    let mut loot_rng = rng_bank.for_run(StreamSlot::CommonLoot, run_number);
    let common_loot = roll_common_loot(&table.common_loot, max_level, &mut loot_rng);

    let unique_value: u64 = unique_drops
        .iter()
        .filter_map(|d| table.item(&d.item_id))
        .map(|i| i.price)
        .sum();
    let total_value = currency * table.currency.unit_price + unique_value;

    log::debug!(
        "run={run_number} max_level={max_level} currency={currency} uniques={} value={total_value}",
        unique_drops.len()
    );

    RunResult {
        run_number,
        max_level,
        currency,
        unique_drops,
        common_loot,
        total_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_item_never_drops() {
        let table = DropTable::builtin();
        let mut rng = RollRng::from_seed(1);
        for _ in 0..10_000 {
            assert!(roll_for_unique(&table, "pet", 5, 1, &mut rng).is_none());
            assert!(roll_for_unique(&table, "cloth", 1, 1, &mut rng).is_none());
            assert!(roll_for_unique(&table, "unknown", 9, 1, &mut rng).is_none());
        }
    }

    #[test]
    fn certain_odds_always_drop_with_resolved_name() {
        let mut table = DropTable::builtin();
        if let Some(row) = table.levels.get_mut(&3) {
            row.rates.rates.insert("eye".into(), Some(1));
        }
        let mut rng = RollRng::from_seed(2);
        let drop = roll_for_unique(&table, "eye", 3, 12, &mut rng).expect("1/1 always drops");
        assert_eq!(drop.item_name, "Eye of Ayak");
        assert_eq!(drop.level, 3);
        assert_eq!(drop.run_number, 12);
    }

    #[test]
    fn unknown_item_name_falls_back_to_id() {
        let mut table = DropTable::builtin();
        if let Some(row) = table.levels.get_mut(&9) {
            row.rates.rates.insert("mystery_box".into(), Some(1));
        }
        let mut rng = RollRng::from_seed(3);
        let drop = roll_for_unique(&table, "mystery_box", 9, 1, &mut rng).expect("drops");
        assert_eq!(drop.item_name, "mystery_box");
    }

    #[test]
    fn dry_run_value_is_currency_only() {
        let table = DropTable::builtin();
        let bank = RngBank::new(5);
        // Levels 1 and 2 hold only cloth at 1/2500; find a run with no drop.
        let result = (1..100)
            .map(|n| simulate_run(&table, 2, n, &bank))
            .find(|r| !r.has_unique())
            .expect("a dry two-level run");
        assert_eq!(result.currency, 0);
        assert_eq!(result.total_value, 0);
        assert_eq!(result.max_level, 2);
    }

    #[test]
    fn run_value_includes_unique_prices() {
        let mut table = DropTable::builtin();
        for row in table.levels.values_mut() {
            for denom in row.rates.rates.values_mut() {
                if denom.is_some() {
                    *denom = Some(1);
                }
            }
        }
        let result = simulate_run(&table, 4, 1, &RngBank::new(9));
        let ids: Vec<_> = result.unique_drops.iter().map(|d| d.item_id.as_str()).collect();
        assert_eq!(ids, vec!["cloth", "cloth", "eye", "cloth", "eye", "treads"]);
        assert_eq!(result.currency, 110);
        let uniques = 3 * 45_000_000 + 2 * 120_000_000 + 85_000_000;
        assert_eq!(result.total_value, 110 * 5_000 + uniques);
    }

    #[test]
    fn levels_past_cap_keep_accruing_cap_yield() {
        let table = DropTable::builtin();
        let result = simulate_run(&table, 12, 1, &RngBank::new(11));
        assert_eq!(result.currency, 550 + 3 * 100);
        assert!(result.unique_drops.iter().all(|d| d.level <= 12));
    }
}
