//! In-memory aggregate of every run in the session.
//!
//! RULE: Only the engine's run loop mutates the store.
//! Counts only grow; the sole way back to zero is `reset()`.

use crate::{
    config::DropTable,
    roll::RunResult,
    types::{ItemId, RunNumber, HISTORY_CAP},
};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Prices captured from the drop table, used for derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub currency_unit_price: u64,
    pub item_prices:         BTreeMap<ItemId, u64>,
}

impl Pricing {
    pub fn from_table(table: &DropTable) -> Self {
        Self {
            currency_unit_price: table.currency.unit_price,
            item_prices:         table.items.iter().map(|i| (i.id.clone(), i.price)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootStore {
    pricing:            Pricing,
    total_runs:         u64,
    total_currency:     u64,
    unique_counts:      BTreeMap<ItemId, u64>,
    drop_runs:          BTreeMap<ItemId, Vec<RunNumber>>,
    current_dry_streak: u64,
    longest_dry_streak: u64,
    last_run:           Option<RunResult>,
    history:            VecDeque<RunResult>,
}

impl LootStore {
    pub fn new(table: &DropTable) -> Self {
        Self::with_pricing(Pricing::from_table(table))
    }

    fn with_pricing(pricing: Pricing) -> Self {
        let unique_counts = pricing.item_prices.keys().map(|id| (id.clone(), 0)).collect();
        Self {
            pricing,
            total_runs: 0,
            total_currency: 0,
            unique_counts,
            drop_runs: BTreeMap::new(),
            current_dry_streak: 0,
            longest_dry_streak: 0,
            last_run: None,
            history: VecDeque::with_capacity(HISTORY_CAP + 1),
        }
    }

    pub fn add_run_result(&mut self, result: RunResult) {
        self.total_runs += 1;
        self.total_currency += result.currency;

        if result.has_unique() {
            for drop in &result.unique_drops {
                *self.unique_counts.entry(drop.item_id.clone()).or_insert(0) += 1;
                self.drop_runs
                    .entry(drop.item_id.clone())
                    .or_default()
                    .push(drop.run_number);
            }
            self.longest_dry_streak = self.longest_dry_streak.max(self.current_dry_streak);
            self.current_dry_streak = 0;
        } else {
            self.current_dry_streak += 1;
        }

        self.last_run = Some(result.clone());
        self.history.push_back(result);
        if self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    /// Back to the freshly constructed state in a single call.
    pub fn reset(&mut self) {
        *self = Self::with_pricing(self.pricing.clone());
    }

    pub fn total_runs(&self) -> u64 { self.total_runs }
    pub fn total_currency(&self) -> u64 { self.total_currency }
    pub fn current_dry_streak(&self) -> u64 { self.current_dry_streak }
    pub fn longest_dry_streak(&self) -> u64 { self.longest_dry_streak }
    pub fn unique_counts(&self) -> &BTreeMap<ItemId, u64> { &self.unique_counts }
    pub fn last_run(&self) -> Option<&RunResult> { self.last_run.as_ref() }
    pub fn history(&self) -> &VecDeque<RunResult> { &self.history }
    pub fn pricing(&self) -> &Pricing { &self.pricing }

    pub fn unique_count(&self, item_id: &str) -> u64 {
        self.unique_counts.get(item_id).copied().unwrap_or(0)
    }

    /// Run numbers at which `item_id` dropped, in drop order.
    pub fn drop_runs(&self, item_id: &str) -> &[RunNumber] {
        self.drop_runs.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_uniques(&self) -> u64 {
        self.unique_counts.values().sum()
    }

    /// Currency value plus the market value of every unique collected.
    pub fn total_value(&self) -> u64 {
        let currency_value = self.total_currency * self.pricing.currency_unit_price;
        let unique_value: u64 = self
            .unique_counts
            .iter()
            .map(|(id, count)| count * self.pricing.item_prices.get(id).copied().unwrap_or(0))
            .sum();
        currency_value + unique_value
    }

    /// Floor of the average value per run; zero before the first run.
    pub fn value_per_run(&self) -> u64 {
        if self.total_runs == 0 {
            0
        } else {
            self.total_value() / self.total_runs
        }
    }
}
