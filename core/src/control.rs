//! Orchestrator phase and the cooperative stop signal.
//!
//! The phase lives behind a mutex/condvar pair so that `stop()` wakes an
//! in-flight inter-run wait immediately instead of letting it time out.

use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    time::Duration,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Cancelling,
}

#[derive(Debug)]
struct Shared {
    phase: Mutex<Phase>,
    wake:  Condvar,
}

/// Cloneable handle onto the orchestrator's phase.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                phase: Mutex::new(Phase::Idle),
                wake:  Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        // The phase is a plain enum; a poisoned lock still holds a valid value.
        self.shared.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn phase(&self) -> Phase {
        *self.lock()
    }

    /// Raise cancellation. No-op unless a simulation is running.
    pub fn stop(&self) -> bool {
        let mut phase = self.lock();
        if *phase != Phase::Running {
            return false;
        }
        *phase = Phase::Cancelling;
        self.shared.wake.notify_all();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase() == Phase::Cancelling
    }

    /// Idle → Running. Returns false when a simulation is already active.
    pub(crate) fn try_begin(&self) -> bool {
        let mut phase = self.lock();
        if *phase != Phase::Idle {
            return false;
        }
        *phase = Phase::Running;
        true
    }

    pub(crate) fn finish(&self) {
        *self.lock() = Phase::Idle;
        self.shared.wake.notify_all();
    }

    /// Sleep for `delay` unless cancelled first. Returns true if woken by `stop()`.
    pub(crate) fn wait(&self, delay: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .shared
            .wake
            .wait_timeout_while(guard, delay, |phase| *phase == Phase::Running)
            .unwrap_or_else(|e| e.into_inner());
        *guard == Phase::Cancelling
    }
}

/// Returns the handle to Idle when dropped, however the run loop exits.
pub(crate) struct RunGuard<'a> {
    handle: &'a StopHandle,
}

impl<'a> RunGuard<'a> {
    pub(crate) fn new(handle: &'a StopHandle) -> Self {
        Self { handle }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.handle.finish();
    }
}
