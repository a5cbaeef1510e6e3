//! Completion latch shared by the splits of one job
//!
//! A `TranslationLock` starts at the number of splits in its job and is
//! counted down once per completed split. Callers block in [`TranslationLock::wait`]
//! (or the bounded [`TranslationLock::wait_timeout`]) until the count reaches zero.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// N-of-N completion latch
#[derive(Debug)]
pub struct TranslationLock {
    total: usize,
    remaining: Mutex<usize>,
    completed: Condvar,
}

impl TranslationLock {
    /// Create a latch expecting `count` completions
    pub fn new(count: usize) -> Self {
        Self {
            total: count,
            remaining: Mutex::new(count),
            completed: Condvar::new(),
        }
    }

    /// Record one completed split; wakes all waiters when the count hits zero
    pub fn split_completed(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            tracing::warn!(total = self.total, "completion reported on a resolved lock");
            return;
        }

        *remaining -= 1;
        if *remaining == 0 {
            self.completed.notify_all();
        }
    }

    /// Block until every split has completed
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.completed.wait(&mut remaining);
        }
    }

    /// Block until every split has completed or `timeout` elapses.
    ///
    /// Returns `true` if the count reached zero in time. Timing out is not an
    /// error: the caller decides what a partial completion means.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut remaining = self.remaining.lock();

        while *remaining > 0 {
            match deadline {
                Some(deadline) => {
                    if self.completed.wait_until(&mut remaining, deadline).timed_out() {
                        return *remaining == 0;
                    }
                }
                // Deadline overflows Instant: treat as unbounded
                None => self.completed.wait(&mut remaining),
            }
        }

        true
    }

    /// Splits not yet completed
    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }

    /// Number of splits the lock was created for
    pub fn total(&self) -> usize {
        self.total
    }

    /// True once every split has completed
    pub fn is_completed(&self) -> bool {
        self.remaining() == 0
    }
}
