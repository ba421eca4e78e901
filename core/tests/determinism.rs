//! Same seed, same settings: identical histories.
//!
//! Two engines with the same seed must produce byte-identical run
//! histories, however the runs are batched.

use delve_core::{clock::SimSpeed, engine::SimEngine, settings::SimSettings};

fn build_engine(seed: u64) -> SimEngine {
    let settings = SimSettings {
        speed: SimSpeed::Instant,
        seed: Some(seed),
        ..Default::default()
    };
    SimEngine::build(settings).expect("engine builds")
}

fn history_json(engine: &SimEngine) -> Vec<String> {
    engine
        .store()
        .history()
        .iter()
        .map(|run| serde_json::to_string(run).expect("serialize run"))
        .collect()
}

#[test]
fn same_seed_produces_identical_histories() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    const RUNS: u64 = 400;

    let mut engine_a = build_engine(SEED);
    let mut engine_b = build_engine(SEED);

    engine_a.run(Some(RUNS));
    engine_b.run(Some(RUNS));

    let log_a = history_json(&engine_a);
    let log_b = history_json(&engine_b);

    assert_eq!(log_a.len(), log_b.len(), "History lengths differ: {} vs {}", log_a.len(), log_b.len());

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a, b, "History diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
}

#[test]
fn batching_does_not_change_results() {
    let mut one_batch = build_engine(77);
    let mut many_batches = build_engine(77);

    one_batch.run(Some(300));
    for _ in 0..3 {
        many_batches.run(Some(100));
    }

    assert_eq!(history_json(&one_batch), history_json(&many_batches));
    assert_eq!(one_batch.store().unique_counts(), many_batches.store().unique_counts());
}

#[test]
fn different_seeds_produce_different_histories() {
    let mut engine_a = build_engine(42);
    let mut engine_b = build_engine(99);

    engine_a.run(Some(50));
    engine_b.run(Some(50));

    // Common loot alone differs between seeds on almost every run.
    let any_different = history_json(&engine_a)
        .iter()
        .zip(history_json(&engine_b).iter())
        .any(|(a, b)| a != b);
    assert!(any_different, "Different seeds produced identical histories; seed is not being used");
}
