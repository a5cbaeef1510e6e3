//! Translation split: the unit of decoder work

use crate::error::TranslationError;
use crate::lock::TranslationLock;
use crate::priority::Priority;
use mmt_types::{Sentence, Translation};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Timing telemetry collected while a split moves through the system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitTimings {
    /// Splits already queued when this one was admitted
    pub queue_size: usize,
    /// When the split entered the scheduler queue
    pub queue_enter: Option<Instant>,
    /// When the decoder started on the split
    pub translation_begin: Option<Instant>,
    /// When the decoder finished the split
    pub translation_end: Option<Instant>,
}

/// One sentence to translate (or align) as part of a larger request.
///
/// Shared as `Arc<TranslationSplit>` between the caller, the queue and the
/// worker that processes it. The result is published exactly once.
#[derive(Debug)]
pub struct TranslationSplit {
    priority: Priority,
    sentence: Sentence,
    reference: Option<Vec<String>>,
    expiration: Option<Instant>,
    result: OnceLock<Result<Translation, TranslationError>>,
    lock: OnceLock<Arc<TranslationLock>>,
    timings: Mutex<SplitTimings>,
}

impl TranslationSplit {
    /// Create a split that never expires
    pub fn new(sentence: Sentence, priority: Priority) -> Self {
        Self {
            priority,
            sentence,
            reference: None,
            expiration: None,
            result: OnceLock::new(),
            lock: OnceLock::new(),
            timings: Mutex::new(SplitTimings::default()),
        }
    }

    /// Create an alignment-only split for `sentence` against `reference`
    pub fn alignment(sentence: Sentence, reference: Vec<String>, priority: Priority) -> Self {
        Self::new(sentence, priority).with_reference(reference)
    }

    /// Set an absolute expiration
    pub fn with_expiration(mut self, expiration: Instant) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Expire `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(expiration) => self.with_expiration(expiration),
            None => self,
        }
    }

    /// Attach a reference translation, turning the split into an alignment request
    pub fn with_reference(mut self, reference: Vec<String>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Split priority
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Input sentence
    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    /// Reference translation, for alignment-only splits
    pub fn reference(&self) -> Option<&[String]> {
        self.reference.as_deref()
    }

    /// Absolute expiration, `None` if the split never expires
    pub fn expiration(&self) -> Option<Instant> {
        self.expiration
    }

    /// Fail with `Timeout` if the expiration has passed.
    ///
    /// Workers call this right before handing the split to the decoder.
    pub fn ensure_valid(&self) -> Result<(), TranslationError> {
        match self.expiration {
            Some(expiration) => {
                let now = Instant::now();
                if expiration < now {
                    Err(TranslationError::Timeout {
                        overdue: now - expiration,
                    })
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }

    /// Publish a successful result.
    ///
    /// Must be called at most once per split, and only by the worker that
    /// processed it. Returns `false` (and leaves the first result in place) if
    /// the split was already completed.
    pub fn set_translation(&self, translation: Translation) -> bool {
        self.complete(Ok(translation))
    }

    /// Publish a failure. Same contract as [`TranslationSplit::set_translation`].
    pub fn set_exception(&self, error: TranslationError) -> bool {
        self.complete(Err(error))
    }

    fn complete(&self, result: Result<Translation, TranslationError>) -> bool {
        if self.result.set(result).is_err() {
            tracing::warn!(sentence = %self.sentence, "split completed twice, result ignored");
            return false;
        }

        // Result is written before the lock is notified
        if let Some(lock) = self.lock.get() {
            lock.split_completed();
        }
        true
    }

    /// Final result, once the split has completed
    pub fn result(&self) -> Option<&Result<Translation, TranslationError>> {
        self.result.get()
    }

    /// Translation, if the split completed successfully
    pub fn translation(&self) -> Option<&Translation> {
        self.result.get().and_then(|r| r.as_ref().ok())
    }

    /// Error, if the split failed
    pub fn error(&self) -> Option<&TranslationError> {
        self.result.get().and_then(|r| r.as_ref().err())
    }

    /// True once a result has been published
    pub fn is_completed(&self) -> bool {
        self.result.get().is_some()
    }

    /// True once the split belongs to a scheduled job
    pub fn is_scheduled(&self) -> bool {
        self.lock.get().is_some()
    }

    /// Snapshot of the timing telemetry
    pub fn timings(&self) -> SplitTimings {
        *self.timings.lock()
    }

    /// Stamp decoder start
    pub fn on_translation_begin(&self, at: Instant) {
        self.timings.lock().translation_begin = Some(at);
    }

    /// Stamp decoder end
    pub fn on_translation_end(&self, at: Instant) {
        self.timings.lock().translation_end = Some(at);
    }

    pub(crate) fn on_queue_enter(&self, queue_size: usize, at: Instant) {
        let mut timings = self.timings.lock();
        timings.queue_size = queue_size;
        timings.queue_enter = Some(at);
    }

    /// Bind the split to its job's lock; fails if already bound
    pub(crate) fn bind(&self, lock: Arc<TranslationLock>) -> bool {
        self.lock.set(lock).is_ok()
    }
}
