// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Small synchronization helpers shared by the operators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a panicking thread poisoned it.
///
/// Operator state stays consistent between statements, so a poisoned lock
/// carries no half-written data worth refusing.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serializes emission passes.
///
/// Whoever enters first runs `pass` and keeps re-running it for every call
/// that arrived meanwhile; concurrent and re-entrant callers return at once.
/// This keeps `request()` issued from inside `on_next` from recursing.
pub(crate) struct Drain {
    wip: AtomicUsize,
}

impl Drain {
    pub(crate) fn new() -> Self {
        Self {
            wip: AtomicUsize::new(0),
        }
    }

    pub(crate) fn run(&self, mut pass: impl FnMut()) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            pass();
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    #[test]
    fn reentrant_calls_are_folded_into_the_running_pass() {
        let drain = Arc::new(Drain::new());
        let passes = Arc::new(AtomicU32::new(0));
        let depth = Arc::new(AtomicU32::new(0));

        let inner_drain = Arc::clone(&drain);
        let inner_passes = Arc::clone(&passes);
        let inner_depth = Arc::clone(&depth);
        drain.run(|| {
            let current = inner_depth.fetch_add(1, Ordering::SeqCst);
            assert_eq!(current, 0, "passes must never nest");
            if inner_passes.fetch_add(1, Ordering::SeqCst) < 3 {
                inner_drain.run(|| panic!("re-entrant pass must not run inline"));
            }
            inner_depth.fetch_sub(1, Ordering::SeqCst);
        });

        assert_eq!(passes.load(Ordering::SeqCst), 4);
    }
}
