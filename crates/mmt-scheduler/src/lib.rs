//! # mmt-scheduler
//!
//! Translation scheduling core for MMT.
//!
//! This crate provides:
//! - `TranslationSplit`: one sentence of decoder work with priority and expiration
//! - `TranslationLock`: completion latch released when every split of a job is done
//! - `Job`: splits admitted and dequeued together
//! - `Scheduler`: bounded admission, priority ordering and graceful shutdown
//!
//! ## Architecture
//!
//! ```text
//!  producers                                  consumers
//!  schedule() ──┐                       ┌──> take() ──> decoder
//!               v                       |
//!        +-------------------------------+
//!        |  Scheduler (mutex + condvar)  |
//!        |  +-------------------------+  |
//!        |  | JobQueue (policy)       |  |
//!        |  |  priority-classes       |  |
//!        |  |  unified                |  |
//!        |  +-------------------------+  |
//!        +-------------------------------+
//!               |
//!  lock.wait() <┘  released by split.set_translation / set_exception
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use mmt_scheduler::{Priority, Scheduler, TranslationSplit};
//!
//! let scheduler = Scheduler::with_defaults();
//! let split = Arc::new(TranslationSplit::new(sentence, Priority::Normal));
//! let lock = scheduler.schedule(direction, vec![split.clone()], None)?;
//! lock.wait();
//! let translation = split.translation();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod job;
mod lock;
mod priority;
mod queue;
mod scheduler;
mod split;

pub use config::{SchedulerConfig, SchedulingPolicy, DEFAULT_QUEUE_SIZE};
pub use error::{SchedulerError, SchedulerResult, TranslationError};
pub use job::Job;
pub use lock::TranslationLock;
pub use priority::Priority;
pub use queue::{ClassQueues, JobQueue, UnifiedQueue};
pub use scheduler::{
    Scheduler, METRIC_JOBS_ADMITTED, METRIC_JOBS_REJECTED, METRIC_QUEUE_SPLITS, METRIC_QUEUE_WAIT,
};
pub use split::{SplitTimings, TranslationSplit};
