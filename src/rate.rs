//! Fixed-window admission control.
//!
//! The gate owns the *policy* only: reset an expired window, then admit and
//! count iff the budget allows. Storage belongs to the [`CounterStore`]
//! collaborator — typically the host's session layer. [`MemoryCounters`]
//! ships for hosts without one, and for tests.
//!
//! Every function takes an explicit `now` (Unix seconds) so that windowing
//! is deterministic; [`Router::dispatch`](crate::Router::dispatch) supplies
//! wall-clock time.

use std::collections::HashMap;
use std::sync::Mutex;

/// One open counting window for one key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    /// Unix second at which the window opened.
    pub started: u64,
    /// Admissions counted inside the window. Never exceeds the limit.
    pub count: u32,
}

/// Keyed storage for [`Window`] records.
///
/// `modify` must be an atomic read-modify-write for the one key: two
/// concurrent `admit` calls sharing a key must not both observe the same
/// pre-increment count. `None` in the slot means no window exists yet; the
/// callback may create or clear it.
pub trait CounterStore: Send + Sync {
    fn modify(&self, key: &str, op: &mut dyn FnMut(&mut Option<Window>));
}

/// In-process [`CounterStore`] backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryCounters {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryCounters {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounters {
    fn modify(&self, key: &str, op: &mut dyn FnMut(&mut Option<Window>)) {
        let mut windows = self.windows.lock().expect("counter store mutex poisoned");
        let mut slot = windows.get(key).copied();
        op(&mut slot);
        match slot {
            Some(window) => {
                windows.insert(key.to_owned(), window);
            }
            None => {
                windows.remove(key);
            }
        }
    }
}

/// Admits one attempt under `limit` per `window_secs`, counting it.
///
/// An expired window resets before the check, so the first attempt of a new
/// window always succeeds. Returns `false`, mutating nothing further, once
/// the open window's budget is spent.
pub fn admit(
    store: &dyn CounterStore,
    key: &str,
    limit: u32,
    window_secs: u64,
    now: u64,
) -> bool {
    let mut admitted = false;
    store.modify(key, &mut |slot| {
        let window = slot.get_or_insert(Window { started: now, count: 0 });
        if now >= window.started + window_secs {
            window.started = now;
            window.count = 0;
        }
        if window.count < limit {
            window.count += 1;
            admitted = true;
        }
    });
    admitted
}

/// Attempts left in the open window; the full `limit` once it has lapsed.
pub fn remaining(
    store: &dyn CounterStore,
    key: &str,
    limit: u32,
    window_secs: u64,
    now: u64,
) -> u32 {
    let mut left = limit;
    store.modify(key, &mut |slot| {
        if let Some(window) = slot {
            if now < window.started + window_secs {
                left = limit.saturating_sub(window.count);
            }
        }
    });
    left
}

/// Seconds until the open window closes; 0 if no window is open.
pub fn retry_after(store: &dyn CounterStore, key: &str, window_secs: u64, now: u64) -> u64 {
    let mut secs = 0;
    store.modify(key, &mut |slot| {
        if let Some(window) = slot {
            secs = (window.started + window_secs).saturating_sub(now);
        }
    });
    secs
}
