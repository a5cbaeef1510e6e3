//! Fixed-size pool of decoder instances
//!
//! A checkout prefers an idle instance that last served the same language
//! direction, whose per-direction state is still loaded.

use crate::decoder::Decoder;
use crate::error::{DecoderError, DecoderResult};
use mmt_types::LanguageDirection;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};

struct PoolState {
    /// Indices of idle slots
    idle: Vec<usize>,
    /// Direction each slot served last
    last_direction: Vec<Option<LanguageDirection>>,
    closed: bool,
}

/// Pool of decoders handed out one job at a time
pub struct DecoderPool {
    slots: Vec<Mutex<Box<dyn Decoder>>>,
    state: Mutex<PoolState>,
    released: Condvar,
}

impl DecoderPool {
    /// Create a pool owning `decoders`
    pub fn new(decoders: Vec<Box<dyn Decoder>>) -> Self {
        let size = decoders.len();
        Self {
            slots: decoders.into_iter().map(Mutex::new).collect(),
            state: Mutex::new(PoolState {
                idle: (0..size).rev().collect(),
                last_direction: vec![None; size],
                closed: false,
            }),
            released: Condvar::new(),
        }
    }

    /// Create a pool of `size` decoders built by `factory`
    pub fn from_factory<F>(size: usize, mut factory: F) -> Self
    where
        F: FnMut() -> Box<dyn Decoder>,
    {
        Self::new((0..size).map(|_| factory()).collect())
    }

    /// Borrow a decoder for `direction`, blocking until one is idle.
    ///
    /// Fails with `PoolClosed` once the pool is closed, including for callers
    /// already waiting.
    pub fn checkout(&self, direction: &LanguageDirection) -> DecoderResult<PooledDecoder<'_>> {
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(DecoderError::PoolClosed);
            }

            let warm = state
                .idle
                .iter()
                .position(|&index| state.last_direction[index].as_ref() == Some(direction));

            // Otherwise an unused instance, then any idle one
            let position = warm
                .or_else(|| {
                    state
                        .idle
                        .iter()
                        .position(|&index| state.last_direction[index].is_none())
                })
                .or_else(|| state.idle.len().checked_sub(1));

            if let Some(position) = position {
                let index = state.idle.swap_remove(position);
                drop(state);

                tracing::trace!(slot = index, %direction, warm = warm.is_some(), "decoder checked out");
                return Ok(PooledDecoder {
                    decoder: self.slots[index].lock(),
                    lease: Lease {
                        pool: self,
                        index,
                        direction: direction.clone(),
                    },
                });
            }

            self.released.wait(&mut state);
        }
    }

    fn release(&self, index: usize, direction: LanguageDirection) {
        debug_assert!(
            !self.slots[index].is_locked(),
            "slot {index} returned while its decoder is still borrowed"
        );

        let mut state = self.state.lock();
        state.last_direction[index] = Some(direction);
        state.idle.push(index);
        drop(state);

        self.released.notify_one();
    }

    /// Refuse further checkouts and wake every waiter
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);

        self.released.notify_all();
        tracing::debug!(size = self.size(), "decoder pool closed");
    }

    /// Number of decoder instances
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of instances not checked out
    pub fn idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// True once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Exclusive use of one pooled decoder; returned to the pool on drop
pub struct PooledDecoder<'a> {
    // Dropped before `lease`: the slot is unlocked by the time it is idle again
    decoder: MutexGuard<'a, Box<dyn Decoder>>,
    lease: Lease<'a>,
}

impl PooledDecoder<'_> {
    /// Slot index of this instance within the pool
    pub fn slot(&self) -> usize {
        self.lease.index
    }
}

impl Deref for PooledDecoder<'_> {
    type Target = dyn Decoder;

    fn deref(&self) -> &Self::Target {
        &**self.decoder
    }
}

impl DerefMut for PooledDecoder<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.decoder
    }
}

/// Puts a slot back on the idle list when dropped
struct Lease<'a> {
    pool: &'a DecoderPool,
    index: usize,
    direction: LanguageDirection,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.pool.release(self.index, self.direction.clone());
    }
}
