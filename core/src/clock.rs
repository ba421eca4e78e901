//! Simulation clock: speed presets and the pause taken between runs.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// In instant mode the loop still yields the thread this often.
pub const YIELD_EVERY: u64 = 100;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Instant, // no delay; yield every YIELD_EVERY runs
    #[default]
    Fast,    // 10 ms between runs
    Normal,  // 100 ms between runs
    Slow,    // 500 ms between runs
}

impl SimSpeed {
    pub const ALL: [SimSpeed; 4] = [Self::Instant, Self::Fast, Self::Normal, Self::Slow];

    pub fn delay(&self) -> Duration {
        match self {
            Self::Instant => Duration::ZERO,
            Self::Fast    => Duration::from_millis(10),
            Self::Normal  => Duration::from_millis(100),
            Self::Slow    => Duration::from_millis(500),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Fast    => "fast",
            Self::Normal  => "normal",
            Self::Slow    => "slow",
        }
    }
}

impl fmt::Display for SimSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|speed| speed.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown speed '{s}' (expected instant, fast, normal or slow)"))
    }
}

/// What the run loop does after finishing run `index` of `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    None,
    Wait(Duration),
    Yield,
}

/// No wait follows the last run of a batch.
pub fn pause_after(delay: Duration, index: u64, count: u64) -> Pause {
    if delay.is_zero() {
        if index % YIELD_EVERY == 0 {
            Pause::Yield
        } else {
            Pause::None
        }
    } else if index < count {
        Pause::Wait(delay)
    } else {
        Pause::None
    }
}
