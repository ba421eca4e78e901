//! Flavor loot roller. Purely cosmetic: never affects value or counts.

use crate::{config::CommonLootEntry, rng::RollRng, types::{ItemId, Level}};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LootItem {
    pub id:       ItemId,
    pub name:     String,
    pub quantity: u32,
    pub image:    Option<String>,
}

/// Number of distinct stacks a run at `level` yields before capping to the pool.
fn stack_count(level: Level, rng: &mut RollRng) -> usize {
    2 + rng.next_u64_below(3) as usize + (level / 3) as usize
}

/// Draw distinct entries without replacement, each with a quantity in
/// its inclusive `[min_qty, max_qty]` range.
pub fn roll_common_loot(pool: &[CommonLootEntry], level: Level, rng: &mut RollRng) -> Vec<LootItem> {
    let count = stack_count(level, rng).min(pool.len());
    let mut remaining: Vec<&CommonLootEntry> = pool.iter().collect();
    let mut loot = Vec::with_capacity(count);

    for _ in 0..count {
        let idx = rng.next_u64_below(remaining.len() as u64) as usize;
        let entry = remaining.remove(idx);
        loot.push(LootItem {
            id:       entry.id.clone(),
            name:     entry.name.clone(),
            quantity: rng.next_in_range(entry.min_qty, entry.max_qty),
            image:    entry.image.clone(),
        });
    }
    loot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DropTable;
    use std::collections::HashSet;

    #[test]
    fn stacks_are_distinct_and_within_range() {
        let table = DropTable::builtin();
        let mut rng = RollRng::from_seed(77);
        for level in 1..=12 {
            let loot = roll_common_loot(&table.common_loot, level, &mut rng);
            let min = 2 + (level / 3) as usize;
            assert!(loot.len() >= min && loot.len() <= min + 2, "level {level}: {}", loot.len());

            let ids: HashSet<_> = loot.iter().map(|l| l.id.as_str()).collect();
            assert_eq!(ids.len(), loot.len(), "duplicate stack at level {level}");

            for item in &loot {
                let entry = table
                    .common_loot
                    .iter()
                    .find(|e| e.id == item.id)
                    .expect("rolled item comes from the pool");
                assert!(item.quantity >= entry.min_qty && item.quantity <= entry.max_qty);
            }
        }
    }

    #[test]
    fn count_is_capped_by_pool_size() {
        let pool = DropTable::builtin().common_loot[..3].to_vec();
        let mut rng = RollRng::from_seed(8);
        let loot = roll_common_loot(&pool, 30, &mut rng);
        assert_eq!(loot.len(), 3);
    }

    #[test]
    fn empty_pool_rolls_nothing() {
        let mut rng = RollRng::from_seed(8);
        assert!(roll_common_loot(&[], 9, &mut rng).is_empty());
    }
}
