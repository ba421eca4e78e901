//! Static drop-table configuration.
//!
//! The table is read once at start (built in, or loaded from a data
//! directory) and never mutated afterwards. Every lookup goes through
//! `normalize_level`, so levels past the cap reuse the cap's row.

use crate::{
    error::{SimError, SimResult},
    types::{normalize_level, ItemId, Level, LEVEL_CAP},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Rare,
    Legendary,
    Pet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UniqueItem {
    pub id:         ItemId,
    pub name:       String,
    pub unlocks_at: Level,
    pub price:      u64,
    pub rarity:     Rarity,
    #[serde(default)]
    pub image:      Option<String>,
}

/// Odds for one level: item id → 1-in-X denominator, `None` when the
/// item cannot drop at this level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DropRateEntry {
    pub rates: BTreeMap<ItemId, Option<u32>>,
}

impl DropRateEntry {
    pub fn denominator(&self, item_id: &str) -> Option<u32> {
        self.rates.get(item_id).copied().flatten()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelConfig {
    pub level:    Level,
    /// Guaranteed currency yield for clearing this level.
    pub currency: u64,
    pub rates:    DropRateEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrencyConfig {
    pub id:         ItemId,
    pub name:       String,
    pub unit_price: u64,
    #[serde(default)]
    pub image:      Option<String>,
}

/// Flavor loot: cosmetic filler, not tied to the unique odds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommonLootEntry {
    pub id:      ItemId,
    pub name:    String,
    #[serde(default)]
    pub image:   Option<String>,
    pub min_qty: u32,
    pub max_qty: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct DropTableFile {
    currency: CurrencyConfig,
    items:    Vec<UniqueItem>,
    levels:   Vec<LevelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommonLootFile {
    common_loot: Vec<CommonLootEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DropTable {
    pub currency:    CurrencyConfig,
    /// Roll order for uniques within a level.
    pub items:       Vec<UniqueItem>,
    pub levels:      BTreeMap<Level, LevelConfig>,
    pub common_loot: Vec<CommonLootEntry>,
}

/// Key level rows by level, refusing a level that appears twice.
fn index_levels(rows: Vec<LevelConfig>) -> SimResult<BTreeMap<Level, LevelConfig>> {
    let mut levels = BTreeMap::new();
    for row in rows {
        let level = row.level;
        if levels.insert(level, row).is_some() {
            return Err(SimError::DuplicateLevel { level });
        }
    }
    Ok(levels)
}

impl DropTable {
    /// Load the table from `{data_dir}/drop_table.json` and
    /// `{data_dir}/common_loot.json`, then validate it.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let table_path = format!("{data_dir}/drop_table.json");
        let table_content = std::fs::read_to_string(&table_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {table_path}: {e}"))?;
        let table_file: DropTableFile = serde_json::from_str(&table_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {table_path}: {e}"))?;

        let loot_path = format!("{data_dir}/common_loot.json");
        let loot_content = std::fs::read_to_string(&loot_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {loot_path}: {e}"))?;
        let loot_file: CommonLootFile = serde_json::from_str(&loot_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {loot_path}: {e}"))?;

        let table = Self {
            currency:    table_file.currency,
            items:       table_file.items,
            levels:      index_levels(table_file.levels)?,
            common_loot: loot_file.common_loot,
        };
        table.validate()?;

        log::info!(
            "Loaded drop table from {data_dir}: {} items, {} levels, {} common loot entries",
            table.items.len(),
            table.levels.len(),
            table.common_loot.len()
        );
        Ok(table)
    }

    /// Every level 1..=cap must exist and nothing above it, denominators
    /// must be positive, item ids unique, and quantity ranges well-formed.
    pub fn validate(&self) -> SimResult<()> {
        if let Some((&level, _)) = self.levels.range(LEVEL_CAP + 1..).next() {
            return Err(SimError::LevelAboveCap { level, cap: LEVEL_CAP });
        }
        for level in 1..=LEVEL_CAP {
            let row = self
                .levels
                .get(&level)
                .ok_or(SimError::MissingLevel { level })?;
            for (item_id, denom) in &row.rates.rates {
                if *denom == Some(0) {
                    return Err(SimError::ZeroDenominator {
                        item_id: item_id.clone(),
                        level,
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                return Err(SimError::DuplicateItem { item_id: item.id.clone() });
            }
        }

        for entry in &self.common_loot {
            if entry.min_qty > entry.max_qty {
                return Err(SimError::InvalidQuantityRange {
                    item_id: entry.id.clone(),
                    min:     entry.min_qty,
                    max:     entry.max_qty,
                });
            }
        }
        Ok(())
    }

    /// The 1-in-X denominator for an item at a level, if it can drop there.
    pub fn drop_rate(&self, item_id: &str, level: Level) -> Option<u32> {
        self.levels
            .get(&normalize_level(level))
            .and_then(|row| row.rates.denominator(item_id))
    }

    /// Guaranteed currency for clearing a single level.
    pub fn currency_at(&self, level: Level) -> u64 {
        self.levels
            .get(&normalize_level(level))
            .map(|row| row.currency)
            .unwrap_or(0)
    }

    /// Total guaranteed currency for a run to `max_level`. Levels past the
    /// cap keep paying the cap's yield, matching what a rolled run accrues.
    pub fn currency_for_run(&self, max_level: Level) -> u64 {
        (1..=max_level).map(|level| self.currency_at(level)).sum()
    }

    pub fn item(&self, item_id: &str) -> Option<&UniqueItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Display name for an item, falling back to the raw id.
    pub fn display_name(&self, item_id: &str) -> String {
        self.item(item_id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| item_id.to_string())
    }

    /// Items that have unlocked by `level`.
    pub fn available_items(&self, level: Level) -> Vec<&UniqueItem> {
        self.items.iter().filter(|i| i.unlocks_at <= level).collect()
    }

    /// The table shipped with the simulator.
    pub fn builtin() -> Self {
        fn row(level: Level, currency: u64, odds: [Option<u32>; 4]) -> (Level, LevelConfig) {
            let rates = ["cloth", "eye", "treads", "pet"]
                .into_iter()
                .zip(odds)
                .map(|(id, d)| (id.to_string(), d))
                .collect();
            (level, LevelConfig { level, currency, rates: DropRateEntry { rates } })
        }

        fn unique(
            id: &str,
            name: &str,
            unlocks_at: Level,
            price: u64,
            rarity: Rarity,
            image: &str,
        ) -> UniqueItem {
            UniqueItem {
                id: id.into(),
                name: name.into(),
                unlocks_at,
                price,
                rarity,
                image: Some(image.into()),
            }
        }

        fn common(id: &str, name: &str, image: &str, min_qty: u32, max_qty: u32) -> CommonLootEntry {
            CommonLootEntry {
                id: id.into(),
                name: name.into(),
                image: Some(image.into()),
                min_qty,
                max_qty,
            }
        }

        Self {
            currency: CurrencyConfig {
                id:         "demon_tear".into(),
                name:       "Demon Tear".into(),
                unit_price: 5_000,
                image:      Some("demon_tear.png".into()),
            },
            items: vec![
                unique("cloth",  "Mokhaiotl Cloth", 2, 45_000_000,  Rarity::Rare,      "mokhaiotl_cloth.png"),
                unique("eye",    "Eye of Ayak",     3, 120_000_000, Rarity::Legendary, "eye_of_ayak.png"),
                unique("treads", "Avernic Treads",  4, 85_000_000,  Rarity::Legendary, "avernic_treads.png"),
                unique("pet",    "Dom",             6, 0,           Rarity::Pet,       "dom.png"),
            ],
            levels: [
                row(1, 0,   [None,       None,       None,       None]),
                row(2, 0,   [Some(2500), None,       None,       None]),
                row(3, 50,  [Some(2000), Some(2000), None,       None]),
                row(4, 60,  [Some(1350), Some(1350), Some(1350), None]),
                row(5, 70,  [Some(810),  Some(810),  Some(810),  None]),
                row(6, 80,  [Some(765),  Some(765),  Some(765),  Some(1000)]),
                row(7, 90,  [Some(720),  Some(720),  Some(720),  Some(750)]),
                row(8, 100, [Some(630),  Some(630),  Some(630),  Some(500)]),
                row(9, 100, [Some(540),  Some(540),  Some(540),  Some(250)]),
            ]
            .into_iter()
            .collect(),
            common_loot: vec![
                common("gold_ore",           "Gold Ore",            "gold_ore.png",                     50,  150),
                common("coal",               "Coal",                "coal.png",                         100, 300),
                common("runite_ore",         "Runite Ore",          "runite_ore.png",                   10,  40),
                common("death_rune",         "Death Rune",          "death_rune.png",                   100, 300),
                common("chaos_rune",         "Chaos Rune",          "chaos_rune.png",                   150, 400),
                common("fire_rune",          "Fire Rune",           "fire_rune.png",                    200, 500),
                common("earth_rune",         "Earth Rune",          "earth_rune.png",                   200, 500),
                common("raw_shark",          "Raw Shark",           "raw_shark.png",                    20,  60),
                common("sun_kissed_bones",   "Sun-kissed Bones",    "sun-kissed_bones.png",             10,  30),
                common("ranarr_seed",        "Ranarr Seed",         "ranarr_seed.png",                  2,   6),
                common("celastrus_seed",     "Celastrus Seed",      "celastrus_seed.png",               1,   3),
                common("spirit_seed",        "Spirit Seed",         "spirit_seed.png",                  1,   2),
                common("dragon_dart_tip",    "Dragon Dart Tip",     "dragon_dart_tip.png",              20,  50),
                common("dragon_med_helm",    "Dragon Med Helm",     "dragon_med_helm.png",              1,   1),
                common("dragon_platelegs",   "Dragon Platelegs",    "dragon_platelegs.png",             1,   1),
                common("rune_pickaxe",       "Rune Pickaxe",        "rune_pickaxe.png",                 1,   1),
                common("mystic_earth_staff", "Mystic Earth Staff",  "mystic_earth_staff.png",           1,   1),
                common("onyx_bolts",         "Onyx Bolts (e)",      "onyx_bolts.png",                   10,  30),
                common("steel_cannonball",   "Steel Cannonball",    "steel_cannonball.png",             100, 300),
                common("clue_elite",         "Clue Scroll (elite)", "clue_scroll_(elite).png",          1,   1),
                common("aether_catalyst",    "Aether Catalyst",     "aether_catalyst.png",              1,   3),
                common("mokhaiotl_waystone", "Mokhaiotl Waystone",  "mokhaiotl_waystone_5.png",         1,   5),
                common("shark_lure",         "Shark Lure",          "shark_lure.png",                   1,   3),
                common("tooth_half",         "Tooth Half of Key",   "tooth_half_of_key_(moon_key).png", 1,   1),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        DropTable::builtin().validate().expect("builtin table validates");
    }

    #[test]
    fn repeated_level_rows_are_rejected() {
        let table = DropTable::builtin();
        let mut rows: Vec<LevelConfig> = table.levels.values().cloned().collect();
        rows.push(table.levels[&4].clone());
        assert!(matches!(index_levels(rows), Err(SimError::DuplicateLevel { level: 4 })));
    }

    #[test]
    fn rows_above_cap_are_rejected() {
        let mut table = DropTable::builtin();
        let mut extra = table.levels[&LEVEL_CAP].clone();
        extra.level = LEVEL_CAP + 1;
        table.levels.insert(extra.level, extra);
        assert!(matches!(
            table.validate(),
            Err(SimError::LevelAboveCap { level: 10, cap: LEVEL_CAP })
        ));
    }

    #[test]
    fn rates_past_cap_reuse_cap_row() {
        let table = DropTable::builtin();
        assert_eq!(table.drop_rate("pet", 9), Some(250));
        assert_eq!(table.drop_rate("pet", 15), Some(250));
        assert_eq!(table.currency_at(12), 100);
    }

    #[test]
    fn unknown_item_and_locked_levels_have_no_rate() {
        let table = DropTable::builtin();
        assert_eq!(table.drop_rate("pet", 5), None);
        assert_eq!(table.drop_rate("cloth", 1), None);
        assert_eq!(table.drop_rate("twisted_bow", 9), None);
        assert_eq!(table.drop_rate("cloth", 0), None);
    }

    #[test]
    fn currency_for_full_run_matches_table() {
        let table = DropTable::builtin();
        assert_eq!(table.currency_for_run(9), 550);
        assert_eq!(table.currency_for_run(11), 750);
        assert_eq!(table.currency_for_run(2), 0);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let table = DropTable::builtin();
        assert_eq!(table.display_name("eye"), "Eye of Ayak");
        assert_eq!(table.display_name("mystery"), "mystery");
    }

    #[test]
    fn available_items_follow_unlock_levels() {
        let table = DropTable::builtin();
        let ids: Vec<_> = table.available_items(4).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["cloth", "eye", "treads"]);
        assert_eq!(table.available_items(1).len(), 0);
        assert_eq!(table.available_items(9).len(), 4);
    }

    #[test]
    fn zero_denominator_is_rejected() {
        let mut table = DropTable::builtin();
        if let Some(row) = table.levels.get_mut(&4) {
            row.rates.rates.insert("eye".into(), Some(0));
        }
        assert!(matches!(
            table.validate(),
            Err(SimError::ZeroDenominator { level: 4, .. })
        ));
    }

    #[test]
    fn missing_level_is_rejected() {
        let mut table = DropTable::builtin();
        table.levels.remove(&7);
        assert!(matches!(table.validate(), Err(SimError::MissingLevel { level: 7 })));
    }

    #[test]
    fn duplicate_item_is_rejected() {
        let mut table = DropTable::builtin();
        let dup = table.items[0].clone();
        table.items.push(dup);
        assert!(matches!(table.validate(), Err(SimError::DuplicateItem { .. })));
    }

    #[test]
    fn inverted_quantity_range_is_rejected() {
        let mut table = DropTable::builtin();
        table.common_loot[0].min_qty = 500;
        assert!(matches!(
            table.validate(),
            Err(SimError::InvalidQuantityRange { min: 500, max: 150, .. })
        ));
    }

    #[test]
    fn level_rates_deserialize_nulls_as_unavailable() {
        let json = r#"{"level": 2, "currency": 0, "rates": {"cloth": 2500, "eye": null}}"#;
        let row: LevelConfig = serde_json::from_str(json).expect("parse level row");
        assert_eq!(row.rates.denominator("cloth"), Some(2500));
        assert_eq!(row.rates.denominator("eye"), None);
        assert_eq!(row.rates.denominator("pet"), None);
    }
}
