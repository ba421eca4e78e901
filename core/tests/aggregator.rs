//! Aggregator tests: dry streaks, bounded history, reset.

use delve_core::{
    config::DropTable,
    roll::{LootDrop, RunResult},
    store::LootStore,
    types::{RunNumber, HISTORY_CAP},
};

fn run(n: RunNumber, drops: &[&str]) -> RunResult {
    RunResult {
        run_number:   n,
        max_level:    9,
        currency:     550,
        unique_drops: drops
            .iter()
            .map(|id| LootDrop {
                item_id:    id.to_string(),
                item_name:  id.to_string(),
                level:      9,
                run_number: n,
            })
            .collect(),
        common_loot:  vec![],
        total_value:  550 * 5_000,
    }
}

#[test]
fn dry_run_increments_current_streak_by_one() {
    let mut store = LootStore::new(&DropTable::builtin());
    for n in 1..=4 {
        let before = store.current_dry_streak();
        store.add_run_result(run(n, &[]));
        assert_eq!(store.current_dry_streak(), before + 1);
    }
    // An unfinished streak is not yet committed to the record.
    assert_eq!(store.longest_dry_streak(), 0);
}

#[test]
fn unique_drop_commits_and_resets_streak() {
    let mut store = LootStore::new(&DropTable::builtin());
    for n in 1..=5 {
        store.add_run_result(run(n, &[]));
    }
    store.add_run_result(run(6, &["cloth"]));
    assert_eq!(store.current_dry_streak(), 0);
    assert_eq!(store.longest_dry_streak(), 5);

    // A shorter streak does not lower the record.
    for n in 7..=8 {
        store.add_run_result(run(n, &[]));
    }
    store.add_run_result(run(9, &["eye", "pet"]));
    assert_eq!(store.current_dry_streak(), 0);
    assert_eq!(store.longest_dry_streak(), 5);
    assert_eq!(store.unique_count("pet"), 1);
}

#[test]
fn history_keeps_the_most_recent_five_hundred() {
    let mut store = LootStore::new(&DropTable::builtin());
    for n in 1..=600 {
        store.add_run_result(run(n, &[]));
        assert!(store.history().len() <= HISTORY_CAP);
    }

    let numbers: Vec<RunNumber> = store.history().iter().map(|r| r.run_number).collect();
    assert_eq!(numbers.len(), 500);
    assert_eq!(numbers, (101..=600).collect::<Vec<_>>());
    assert_eq!(store.total_runs(), 600);
}

#[test]
fn counts_never_decrease_between_resets() {
    let mut store = LootStore::new(&DropTable::builtin());
    let mut last = store.unique_counts().clone();
    let pattern: [&[&str]; 4] = [&["cloth"], &[], &["eye", "eye"], &["treads"]];
    for (n, drops) in (1..=40).zip(pattern.iter().cycle()) {
        store.add_run_result(run(n, drops));
        for (id, count) in store.unique_counts() {
            assert!(*count >= last.get(id).copied().unwrap_or(0), "{id} decreased");
        }
        last = store.unique_counts().clone();
    }
    assert_eq!(store.unique_count("eye"), 20);
}

#[test]
fn reset_matches_a_fresh_store() {
    let table = DropTable::builtin();
    let mut store = LootStore::new(&table);
    for n in 1..=700 {
        let drops: &[&str] = if n % 97 == 0 { &["treads", "ghost"] } else { &[] };
        store.add_run_result(run(n, drops));
    }
    assert!(store.total_uniques() > 0);

    store.reset();

    assert_eq!(store, LootStore::new(&table));
    assert_eq!(store.total_runs(), 0);
    assert_eq!(store.total_currency(), 0);
    assert_eq!(store.current_dry_streak(), 0);
    assert_eq!(store.longest_dry_streak(), 0);
    assert!(store.history().is_empty());
    assert!(store.last_run().is_none());
}
