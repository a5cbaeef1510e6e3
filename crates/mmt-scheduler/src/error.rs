//! Error types for the scheduler

use crate::priority::Priority;
use std::time::Duration;
use thiserror::Error;

/// Scheduler errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Admitting the job would exceed the total queue capacity
    #[error("temporary overloading: {pending} splits queued, {incoming} incoming, capacity {capacity}")]
    Overloaded {
        /// Splits currently queued
        pending: usize,
        /// Splits in the rejected job
        incoming: usize,
        /// Configured capacity
        capacity: usize,
    },

    /// Admitting the job would exceed its priority class capacity
    #[error("temporary overloading of {priority} queue: {pending} splits queued, {incoming} incoming, capacity {capacity}")]
    ClassOverloaded {
        /// Priority class of the rejected job
        priority: Priority,
        /// Splits currently queued in that class
        pending: usize,
        /// Splits in the rejected job
        incoming: usize,
        /// Configured class capacity
        capacity: usize,
    },

    /// The scheduler has been closed
    #[error("scheduler shut down")]
    ShutDown,

    /// `take` was interrupted because the scheduler closed
    #[error("take interrupted: scheduler closed")]
    Interrupted,

    /// A job must contain at least one split
    #[error("cannot schedule a job without splits")]
    EmptyJob,

    /// A split is already bound to another job
    #[error("split already scheduled")]
    SplitAlreadyScheduled,

    /// An alignment job was given a split without reference
    #[error("alignment split has no reference translation")]
    MissingReference,

    /// Invalid scheduler configuration
    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}

impl SchedulerError {
    /// True for the recoverable "service unavailable" conditions of `schedule`
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            SchedulerError::Overloaded { .. }
                | SchedulerError::ClassOverloaded { .. }
                | SchedulerError::ShutDown
        )
    }
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Failure recorded on a single split
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// The split expired before the decoder picked it up
    #[error("translation timed out ({overdue:?} past expiration)")]
    Timeout {
        /// How long ago the split expired
        overdue: Duration,
    },

    /// The decoder failed
    #[error("decoder failure: {0}")]
    Decoder(String),

    /// The scheduler closed before the split was taken
    #[error("scheduler shut down before the split was processed")]
    ShutDown,
}
