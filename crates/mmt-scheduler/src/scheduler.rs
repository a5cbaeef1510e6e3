//! Admission control and ordering engine
//!
//! Producers call [`Scheduler::schedule`]; a pool of consumers loops on
//! [`Scheduler::take`]. Both share one mutex guarding the pending queue and a
//! condition variable signalled when a job is admitted or the scheduler closes.

use crate::config::{SchedulerConfig, SchedulingPolicy};
use crate::error::{SchedulerError, SchedulerResult, TranslationError};
use crate::job::Job;
use crate::lock::TranslationLock;
use crate::queue::JobQueue;
use crate::split::TranslationSplit;
use mmt_metrics::Metrics;
use mmt_types::{LanguageDirection, ScoreEntry};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counter of admitted jobs
pub const METRIC_JOBS_ADMITTED: &str = "scheduler.jobs.admitted";
/// Counter of jobs rejected with an unavailable error
pub const METRIC_JOBS_REJECTED: &str = "scheduler.jobs.rejected";
/// Gauge of queued splits
pub const METRIC_QUEUE_SPLITS: &str = "scheduler.queue.splits";
/// Histogram of admission-to-take latency, in microseconds
pub const METRIC_QUEUE_WAIT: &str = "scheduler.queue.wait_us";

struct State {
    queue: Box<dyn JobQueue>,
    active: bool,
    next_sequence: u64,
}

/// Translation job scheduler
pub struct Scheduler {
    config: SchedulerConfig,
    state: Mutex<State>,
    available: Condvar,
    metrics: Option<Arc<Metrics>>,
}

impl Scheduler {
    /// Create a scheduler from a validated config
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create a scheduler with the default config
    pub fn with_defaults() -> Self {
        Self::build(SchedulerConfig::default())
    }

    fn build(config: SchedulerConfig) -> Self {
        let queue = config.policy.new_queue(&config);
        Self {
            config,
            state: Mutex::new(State {
                queue,
                active: true,
                next_sequence: 0,
            }),
            available: Condvar::new(),
            metrics: None,
        }
    }

    /// Record admission and queue metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Admit one job made of `splits`, all sharing the returned lock.
    ///
    /// Admission is all-or-nothing: on error no split has been queued. Fails
    /// with `Overloaded`/`ClassOverloaded` when the job does not fit and with
    /// `ShutDown` once the scheduler is closed.
    pub fn schedule(
        &self,
        direction: LanguageDirection,
        splits: Vec<Arc<TranslationSplit>>,
        suggestions: Option<Vec<ScoreEntry>>,
    ) -> SchedulerResult<Arc<TranslationLock>> {
        if splits.is_empty() {
            return Err(SchedulerError::EmptyJob);
        }

        let incoming = splits.len();
        let mut state = self.state.lock();

        if !state.active {
            self.count_rejected();
            return Err(SchedulerError::ShutDown);
        }

        // Also rejects the same split listed twice in one job
        let mut seen = HashSet::with_capacity(incoming);
        if splits.iter().any(|split| {
            split.is_scheduled() || split.is_completed() || !seen.insert(Arc::as_ptr(split))
        }) {
            return Err(SchedulerError::SplitAlreadyScheduled);
        }

        let now = Instant::now();
        let lock = Arc::new(TranslationLock::new(incoming));
        let sequence = state.next_sequence;
        let job = Job::new(direction, splits, suggestions, Arc::clone(&lock), now, sequence);
        let priority = job.priority();

        let pending = state.queue.len();
        let capacity = self.config.queue_size;
        if pending + incoming > capacity {
            tracing::warn!(pending, incoming, capacity, "scheduler overloaded, job rejected");
            self.count_rejected();
            return Err(SchedulerError::Overloaded {
                pending,
                incoming,
                capacity,
            });
        }

        if let Err(err) = state.queue.check_admission(priority, incoming) {
            tracing::warn!(%priority, incoming, "priority class overloaded, job rejected");
            self.count_rejected();
            return Err(err);
        }

        for split in job.splits() {
            if !split.bind(Arc::clone(&lock)) {
                tracing::warn!(sentence = %split.sentence(), "split bound by another scheduler");
            }
            split.on_queue_enter(pending, now);
        }
        state.next_sequence += 1;

        tracing::debug!(
            sequence,
            %priority,
            splits = incoming,
            direction = %job.direction(),
            "job scheduled"
        );
        state.queue.push(job);

        if let Some(metrics) = &self.metrics {
            metrics.increment(METRIC_JOBS_ADMITTED);
            metrics.gauge(METRIC_QUEUE_SPLITS, state.queue.len() as i64);
        }

        drop(state);
        self.available.notify_one();

        Ok(lock)
    }

    /// Admit a single alignment-only split
    pub fn schedule_alignment(
        &self,
        direction: LanguageDirection,
        split: Arc<TranslationSplit>,
    ) -> SchedulerResult<Arc<TranslationLock>> {
        if split.reference().is_none() {
            return Err(SchedulerError::MissingReference);
        }
        self.schedule(direction, vec![split], None)
    }

    /// Block until a job is available.
    ///
    /// Returns `Interrupted` once the scheduler is closed, including for calls
    /// already blocked when `close` runs.
    pub fn take(&self) -> SchedulerResult<Job> {
        let mut state = self.state.lock();
        loop {
            if !state.active {
                return Err(SchedulerError::Interrupted);
            }
            if let Some(job) = state.queue.pop() {
                self.on_taken(&job, state.queue.len());
                return Ok(job);
            }
            self.available.wait(&mut state);
        }
    }

    /// Like [`Scheduler::take`], but gives up after `timeout` with `Ok(None)`
    pub fn take_timeout(&self, timeout: Duration) -> SchedulerResult<Option<Job>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.take().map(Some);
        };
        let mut state = self.state.lock();
        loop {
            if !state.active {
                return Err(SchedulerError::Interrupted);
            }
            if let Some(job) = state.queue.pop() {
                self.on_taken(&job, state.queue.len());
                return Ok(Some(job));
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return Ok(None);
            }
        }
    }

    fn on_taken(&self, job: &Job, remaining: usize) {
        tracing::debug!(sequence = job.sequence(), splits = job.len(), remaining, "job taken");
        if let Some(metrics) = &self.metrics {
            metrics.gauge(METRIC_QUEUE_SPLITS, remaining as i64);
            metrics.observe(METRIC_QUEUE_WAIT, job.timestamp().elapsed().as_micros() as f64);
        }
    }

    fn count_rejected(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.increment(METRIC_JOBS_REJECTED);
        }
    }

    /// Stop accepting work and wake every blocked consumer.
    ///
    /// Idempotent. Jobs already taken keep running; jobs still queued are
    /// dropped and their splits fail with `TranslationError::ShutDown`, which
    /// resolves their locks.
    pub fn close(&self) {
        let drained = {
            let mut state = self.state.lock();
            if !state.active {
                return;
            }
            state.active = false;
            state.queue.drain()
        };
        self.available.notify_all();

        tracing::info!(dropped_jobs = drained.len(), "scheduler closed");
        if let Some(metrics) = &self.metrics {
            metrics.gauge(METRIC_QUEUE_SPLITS, 0);
        }

        for job in drained {
            for split in job.splits() {
                split.set_exception(TranslationError::ShutDown);
            }
        }
    }

    /// False once `close` has been called
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Queued splits
    pub fn pending_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Queued jobs
    pub fn pending_jobs(&self) -> usize {
        self.state.lock().queue.job_count()
    }

    /// Total capacity, in splits
    pub fn capacity(&self) -> usize {
        self.config.queue_size
    }

    /// Active ordering policy
    pub fn policy(&self) -> SchedulingPolicy {
        self.config.policy
    }

    /// Configuration in use
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::with_defaults()
    }
}
