//! Error types for the decoder side

use mmt_scheduler::{SchedulerError, TranslationError};
use std::time::Duration;
use thiserror::Error;

/// Decoder and worker pool errors
#[derive(Debug, Error)]
pub enum DecoderError {
    /// The decoder failed on a batch
    #[error("decoder failure: {0}")]
    Failed(String),

    /// The decoder returned a different number of results than sentences
    #[error("decoder returned {actual} results for {expected} sentences")]
    ResultCount {
        /// Sentences sent to the decoder
        expected: usize,
        /// Results returned
        actual: usize,
    },

    /// The decoder panicked while processing a job
    #[error("decoder panicked: {0}")]
    Panicked(String),

    /// Alignment requested for a split with no reference
    #[error("alignment job without reference translation")]
    MissingReference,

    /// The decoder pool has been closed
    #[error("decoder pool closed")]
    PoolClosed,

    /// A worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for decoder operations
pub type DecoderResult<T> = Result<T, DecoderError>;

/// Errors returned to callers of `Translator`
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The scheduler refused the request
    #[error("translation service unavailable: {0}")]
    Unavailable(#[from] SchedulerError),

    /// No result within the configured timeout
    #[error("translation not completed within {0:?}")]
    Timeout(Duration),

    /// One of the splits failed
    #[error("translation failed: {0}")]
    Failed(#[from] TranslationError),
}

impl TranslateError {
    /// True if retrying later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Unavailable(err) => err.is_unavailable(),
            TranslateError::Timeout(_) => true,
            TranslateError::Failed(err) => matches!(err, TranslationError::Timeout { .. }),
        }
    }
}

/// Result type for `Translator`
pub type TranslateResult<T> = Result<T, TranslateError>;
