//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulator may call a platform RNG while rolling.
//! All randomness flows through RollRng instances derived from the
//! single master seed held by the engine.
//!
//! Each stream is seeded from (master_seed, stream slot, run number), so:
//!   - Run N of a session is reproducible in isolation, regardless of
//!     pacing, cancellation, or how many runs came before it in a batch.
//!   - Common loot rolls never shift the unique-item draws.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::types::RunNumber;

/// A named, deterministic RNG for a single stream.
pub struct RollRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl RollRng {
    /// Create a stream RNG from a seed that has already been derived.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u32 in [min, max], inclusive on both ends.
    pub fn next_in_range(&mut self, min: u32, max: u32) -> u32 {
        let span = u64::from(max.saturating_sub(min)) + 1;
        min + self.next_u64_below(span) as u32
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Hands out per-run streams for a session, indexed by stable slot.
#[derive(Debug, Clone)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_run(&self, slot: StreamSlot, run_number: RunNumber) -> RollRng {
        let derived_seed = self.master_seed
            ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ run_number.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        RollRng::from_seed(derived_seed).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries, only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    UniqueRolls = 0,
    CommonLoot = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UniqueRolls => "unique_rolls",
            Self::CommonLoot => "common_loot",
        }
    }
}
