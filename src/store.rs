use crate::flags::Flag;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Result of a blocking or async wait on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The generation counter moved while we were waiting.
    Notified,
    /// The deadline passed first. Not an error, just a liveness checkpoint.
    TimedOut,
    /// The wait itself failed (scheduler trouble). Callers should fall back
    /// to short-interval polling.
    Failed,
}

/// Counter snapshot, mirrored from the metrics block of the original
/// shared buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreMetrics {
    pub reads: u64,
    pub writes: u64,
    pub waits: u64,
    pub notifies: u64,
}

/// Cross-thread boolean flag store: one packed byte of flags plus a
/// generation counter used as the wait/notify key.
///
/// Flag reads and writes are lock-free (single atomic load, CAS retry loop).
/// The mutex/condvar pair exists only so waiters can sleep; it is never held
/// while flag bits are mutated. A mutation becomes observable to waiters
/// only after the generation counter has been bumped.
pub struct FlagStore {
    flags: AtomicU8,
    generation: AtomicU32,
    gate: Mutex<()>,
    wakeup: Condvar,
    reads: AtomicU64,
    writes: AtomicU64,
    waits: AtomicU64,
    notifies: AtomicU64,
}

impl Default for FlagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagStore {
    pub fn new() -> Self {
        Self {
            flags: AtomicU8::new(Flag::default_byte()),
            generation: AtomicU32::new(0),
            gate: Mutex::new(()),
            wakeup: Condvar::new(),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            waits: AtomicU64::new(0),
            notifies: AtomicU64::new(0),
        }
    }

    /// Single atomic load, mask, test. Never blocks.
    pub fn get(&self, flag: Flag) -> bool {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.flags.load(Ordering::Acquire) & flag.mask() != 0
    }

    /// The whole packed byte in one load, for diff passes.
    pub fn snapshot(&self) -> u8 {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.flags.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Edge-triggered write. Returns `false` without touching the generation
    /// counter when the flag already holds `value`. On an actual change the
    /// CAS loop guarantees concurrent writers of *other* bits are never
    /// clobbered, the generation counter is bumped, and all waiters wake.
    pub fn set(&self, flag: Flag, value: bool) -> bool {
        let mask = flag.mask();
        let mut current = self.flags.load(Ordering::Acquire);
        loop {
            if (current & mask != 0) == value {
                return false;
            }
            let next = if value { current | mask } else { current & !mask };
            match self
                .flags
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bump_generation();
        true
    }

    /// Write every gameplay flag back to its default. Session flags are left
    /// alone. Each changed bit bumps the generation once (edge-triggered).
    pub fn reset_gameplay(&self) {
        for flag in Flag::GAMEPLAY {
            self.set(flag, flag.default_value());
        }
    }

    fn bump_generation(&self) {
        // Bump while holding the gate so a waiter cannot check the counter,
        // lose the race, and then sleep through the notification.
        let guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        drop(guard);
        self.notify();
    }

    /// Wake every waiter. Called by `set` after the generation bump; a bare
    /// notify is not an edge, so waiters re-check the generation and sleep
    /// on to their deadline.
    pub fn notify(&self) {
        self.notifies.fetch_add(1, Ordering::Relaxed);
        self.wakeup.notify_all();
    }

    /// Block until the generation counter moves past its value at entry, or
    /// the timeout elapses. For dedicated worker threads only; the main
    /// thread uses [`FlagStore::wait_async`].
    pub fn wait(&self, timeout: Option<Duration>) -> WaitOutcome {
        self.waits.fetch_add(1, Ordering::Relaxed);
        let entry_generation = self.generation.load(Ordering::Acquire);
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.generation.load(Ordering::Acquire) != entry_generation {
                return WaitOutcome::Notified;
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    let (next, result) = self
                        .wakeup
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    guard = next;
                    if result.timed_out()
                        && self.generation.load(Ordering::Acquire) == entry_generation
                    {
                        return WaitOutcome::TimedOut;
                    }
                }
                None => {
                    guard = self
                        .wakeup
                        .wait(guard)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Same semantics as [`FlagStore::wait`] but suspends only the calling
    /// task: the blocking wait is parked on the runtime's blocking pool so
    /// the cooperative scheduler keeps running.
    pub async fn wait_async(self: &Arc<Self>, timeout: Option<Duration>) -> WaitOutcome {
        let store = Arc::clone(self);
        match tokio::task::spawn_blocking(move || store.wait(timeout)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("store wait task failed: {err}");
                WaitOutcome::Failed
            }
        }
    }

    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            notifies: self.notifies.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_flag_table() {
        let store = FlagStore::new();
        for flag in Flag::ALL {
            assert_eq!(store.get(flag), flag.default_value(), "{flag}");
        }
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn set_is_edge_triggered() {
        let store = FlagStore::new();
        assert!(store.set(Flag::OnGround, true));
        assert!(!store.set(Flag::OnGround, true));
        assert_eq!(store.generation(), 1);
        assert!(store.get(Flag::OnGround));
    }

    #[test]
    fn reset_gameplay_leaves_session_alone() {
        let store = FlagStore::new();
        store.set(Flag::Active, true);
        store.set(Flag::OnGround, true);
        store.set(Flag::SkillToggle, false);
        store.reset_gameplay();
        assert!(store.get(Flag::Active));
        assert!(!store.get(Flag::OnGround));
        assert!(store.get(Flag::SkillToggle));
    }
}
