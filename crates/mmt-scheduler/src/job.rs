//! Jobs: groups of splits admitted and dequeued together

use crate::lock::TranslationLock;
use crate::priority::Priority;
use crate::split::TranslationSplit;
use mmt_types::{LanguageDirection, ScoreEntry};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// A batch of splits sharing one language direction and one completion lock.
///
/// A job is handed to exactly one consumer by `Scheduler::take`; the consumer
/// owns it from then on.
#[derive(Debug)]
pub struct Job {
    direction: LanguageDirection,
    splits: Vec<Arc<TranslationSplit>>,
    suggestions: Option<Vec<ScoreEntry>>,
    priority: Priority,
    timestamp: Instant,
    sequence: u64,
    lock: Arc<TranslationLock>,
}

impl Job {
    /// Build a job; `splits` must be non-empty
    pub(crate) fn new(
        direction: LanguageDirection,
        splits: Vec<Arc<TranslationSplit>>,
        suggestions: Option<Vec<ScoreEntry>>,
        lock: Arc<TranslationLock>,
        timestamp: Instant,
        sequence: u64,
    ) -> Self {
        debug_assert!(!splits.is_empty());
        let priority = effective_priority(&splits);

        Self {
            direction,
            splits,
            suggestions,
            priority,
            timestamp,
            sequence,
            lock,
        }
    }

    /// Language direction of every split in the job
    pub fn direction(&self) -> &LanguageDirection {
        &self.direction
    }

    /// Splits, in submission order
    pub fn splits(&self) -> &[Arc<TranslationSplit>] {
        &self.splits
    }

    /// Translation-memory suggestions for the decoder
    pub fn suggestions(&self) -> Option<&[ScoreEntry]> {
        self.suggestions.as_deref()
    }

    /// Most urgent priority among the splits
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Admission time
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Admission order within the scheduler
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Completion lock shared by the splits
    pub fn lock(&self) -> &Arc<TranslationLock> {
        &self.lock
    }

    /// Number of splits
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    /// Always false for a scheduled job
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// True iff every split carries a reference: align only, do not translate
    pub fn is_alignment_job(&self) -> bool {
        self.splits.iter().all(|split| split.reference().is_some())
    }

    /// Queue order: priority, then admission time, then sequence
    pub(crate) fn queue_order(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// A job is as urgent as its most urgent split
fn effective_priority(splits: &[Arc<TranslationSplit>]) -> Priority {
    splits
        .iter()
        .map(|split| split.priority())
        .min()
        .unwrap_or_default()
}
