//! Snapshot of everything the presentation layer renders.
//!
//! A snapshot is a plain serializable copy: the presentation layer never
//! holds a reference into the live store.

use crate::{
    assets::AssetResolver,
    config::DropTable,
    control::Phase,
    roll::RunResult,
    settings::SimSettings,
    store::LootStore,
    types::{ItemId, Level, RunNumber},
};
use serde::{Deserialize, Serialize};

/// Compact form of a run, used in history and events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub run_number:  RunNumber,
    pub max_level:   Level,
    pub currency:    u64,
    pub uniques:     Vec<ItemId>,
    pub total_value: u64,
}

impl From<&RunResult> for RunSummary {
    fn from(run: &RunResult) -> Self {
        Self {
            run_number:  run.run_number,
            max_level:   run.max_level,
            currency:    run.currency,
            uniques:     run.unique_drops.iter().map(|d| d.item_id.clone()).collect(),
            total_value: run.total_value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemCount {
    pub item_id: ItemId,
    pub name:    String,
    pub count:   u64,
    pub image:   Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    Currency,
    Unique,
    Common,
}

/// One stack shown in the "last roll" panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayItem {
    pub item_id:  ItemId,
    pub name:     String,
    pub quantity: u64,
    pub kind:     DisplayKind,
    pub image:    Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastRoll {
    pub run_number: RunNumber,
    pub items:      Vec<DisplayItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimSnapshot {
    pub phase:              Phase,
    pub is_simulating:      bool,
    pub current_run:        u64,
    pub seed:               u64,
    pub settings:           SimSettings,
    pub total_runs:         u64,
    pub total_currency:     u64,
    pub unique_counts:      Vec<ItemCount>,
    pub total_uniques:      u64,
    pub total_value:        u64,
    pub value_per_run:      u64,
    pub current_dry_streak: u64,
    pub longest_dry_streak: u64,
    pub last_roll:          Option<LastRoll>,
    pub history:            Vec<RunSummary>,
}

/// Engine-side state that is not part of the store.
pub struct EngineView<'a> {
    pub phase:       Phase,
    pub current_run: u64,
    pub seed:        u64,
    pub settings:    &'a SimSettings,
}

pub fn capture(
    view: EngineView<'_>,
    table: &DropTable,
    store: &LootStore,
    assets: &AssetResolver,
) -> SimSnapshot {
    // Table order first, then any ids the table does not know.
    let mut unique_counts: Vec<ItemCount> = table
        .items
        .iter()
        .map(|item| ItemCount {
            item_id: item.id.clone(),
            name:    item.name.clone(),
            count:   store.unique_count(&item.id),
            image:   assets.image_path(&item.id),
        })
        .collect();
    unique_counts.extend(
        store
            .unique_counts()
            .iter()
            .filter(|(id, _)| table.item(id).is_none())
            .map(|(id, count)| ItemCount {
                item_id: id.clone(),
                name:    id.clone(),
                count:   *count,
                image:   None,
            }),
    );

    SimSnapshot {
        phase:              view.phase,
        is_simulating:      view.phase != Phase::Idle,
        current_run:        view.current_run,
        seed:               view.seed,
        settings:           view.settings.clone(),
        total_runs:         store.total_runs(),
        total_currency:     store.total_currency(),
        unique_counts,
        total_uniques:      store.total_uniques(),
        total_value:        store.total_value(),
        value_per_run:      store.value_per_run(),
        current_dry_streak: store.current_dry_streak(),
        longest_dry_streak: store.longest_dry_streak(),
        last_roll:          store.last_run().map(|run| last_roll(run, table, assets)),
        history:            store.history().iter().map(RunSummary::from).collect(),
    }
}

fn last_roll(run: &RunResult, table: &DropTable, assets: &AssetResolver) -> LastRoll {
    let mut items = Vec::with_capacity(1 + run.unique_drops.len() + run.common_loot.len());

    if run.currency > 0 {
        items.push(DisplayItem {
            item_id:  table.currency.id.clone(),
            name:     table.currency.name.clone(),
            quantity: run.currency,
            kind:     DisplayKind::Currency,
            image:    assets.image_path(&table.currency.id),
        });
    }
    items.extend(run.unique_drops.iter().map(|drop| DisplayItem {
        item_id:  drop.item_id.clone(),
        name:     drop.item_name.clone(),
        quantity: 1,
        kind:     DisplayKind::Unique,
        image:    assets.image_path(&drop.item_id),
    }));
    items.extend(run.common_loot.iter().map(|loot| DisplayItem {
        item_id:  loot.id.clone(),
        name:     loot.name.clone(),
        quantity: u64::from(loot.quantity),
        kind:     DisplayKind::Common,
        image:    assets.image_path(&loot.id),
    }));

    LastRoll { run_number: run.run_number, items }
}
