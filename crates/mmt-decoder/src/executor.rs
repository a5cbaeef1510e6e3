//! Decoder worker threads
//!
//! Each worker loops on `Scheduler::take`, runs the job through a pooled
//! decoder and publishes one result per split. A failing job never takes its
//! worker down with it.

use crate::error::{DecoderError, DecoderResult};
use crate::pool::DecoderPool;
use mmt_metrics::{timed, Metrics};
use mmt_scheduler::{Job, Scheduler, SchedulerError, TranslationError, TranslationSplit};
use mmt_types::{Sentence, Translation};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Histogram of decoder call latency, in microseconds
pub const METRIC_DECODE_TIME: &str = "decoder.decode_us";
/// Counter of splits translated successfully
pub const METRIC_SPLITS_TRANSLATED: &str = "decoder.splits.translated";
/// Counter of splits failed by a decoder error or panic
pub const METRIC_SPLITS_FAILED: &str = "decoder.splits.failed";
/// Counter of splits that expired before decoding
pub const METRIC_SPLITS_EXPIRED: &str = "decoder.splits.expired";

/// Processes scheduled jobs with decoders from a shared pool
#[derive(Clone)]
pub struct DecoderExecutor {
    scheduler: Arc<Scheduler>,
    pool: Arc<DecoderPool>,
    metrics: Arc<Metrics>,
}

impl DecoderExecutor {
    /// Create an executor
    pub fn new(scheduler: Arc<Scheduler>, pool: Arc<DecoderPool>) -> Self {
        Self {
            scheduler,
            pool,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Record decoder metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Take and process jobs until the scheduler closes
    pub fn run(&self) {
        loop {
            match self.scheduler.take() {
                Ok(job) => self.process(&job),
                Err(SchedulerError::Interrupted) => break,
                Err(err) => {
                    warn!(%err, "unexpected scheduler error, worker exiting");
                    break;
                }
            }
        }
    }

    /// Process one job; every split of `job` is completed on return
    pub fn process(&self, job: &Job) {
        let pending = self.filter(job);
        if pending.is_empty() {
            return;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.decode(job, &pending)))
            .unwrap_or_else(|payload| Err(DecoderError::Panicked(panic_message(&*payload))));

        if let Err(err) = outcome {
            error!(
                direction = %job.direction(),
                splits = pending.len(),
                %err,
                "decoding failed"
            );

            let message = err.to_string();
            let mut failed = 0;
            for split in pending.iter().filter(|split| !split.is_completed()) {
                split.set_exception(TranslationError::Decoder(message.clone()));
                failed += 1;
            }
            self.metrics.counter(METRIC_SPLITS_FAILED, failed);
        }
    }

    /// Resolve splits that need no decoding; return the rest
    fn filter<'a>(&self, job: &'a Job) -> Vec<&'a Arc<TranslationSplit>> {
        let mut pending = Vec::with_capacity(job.len());

        for split in job.splits() {
            if let Err(err) = split.ensure_valid() {
                debug!(%err, "split expired before decoding");
                self.metrics.increment(METRIC_SPLITS_EXPIRED);
                split.set_exception(err);
            } else if !split.sentence().has_words() {
                split.set_translation(Translation::empty());
            } else {
                pending.push(split);
            }
        }
        pending
    }

    fn decode(&self, job: &Job, pending: &[&Arc<TranslationSplit>]) -> DecoderResult<()> {
        let mut decoder = self.pool.checkout(job.direction())?;

        let begin = Instant::now();
        for split in pending {
            split.on_translation_begin(begin);
        }

        let sentences: Vec<&Sentence> = pending.iter().map(|split| split.sentence()).collect();
        let translations = timed!(self.metrics, METRIC_DECODE_TIME, {
            if job.is_alignment_job() {
                let references = pending
                    .iter()
                    .map(|split| split.reference().ok_or(DecoderError::MissingReference))
                    .collect::<DecoderResult<Vec<_>>>()?;
                decoder.align(job.direction(), &sentences, &references)
            } else {
                decoder.translate(job.direction(), &sentences, job.suggestions())
            }
        })?;
        drop(decoder);

        if translations.len() != pending.len() {
            return Err(DecoderError::ResultCount {
                expected: pending.len(),
                actual: translations.len(),
            });
        }

        let end = Instant::now();
        for (split, translation) in pending.iter().zip(translations) {
            split.on_translation_end(end);
            split.set_translation(translation);
        }
        self.metrics.counter(METRIC_SPLITS_TRANSLATED, pending.len() as u64);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A set of worker threads sharing one scheduler and decoder pool
pub struct ExecutorPool {
    executor: DecoderExecutor,
    workers: Vec<JoinHandle<()>>,
}

impl ExecutorPool {
    /// Spawn `threads` workers running `executor`
    pub fn start(executor: DecoderExecutor, threads: usize) -> DecoderResult<Self> {
        let mut workers = Vec::with_capacity(threads);

        for id in 0..threads {
            let worker = executor.clone();
            let handle = thread::Builder::new()
                .name(format!("decoder-executor-{id}"))
                .spawn(move || {
                    debug!(worker = id, "decoder executor started");
                    worker.run();
                    debug!(worker = id, "decoder executor stopped");
                })?;
            workers.push(handle);
        }

        info!(threads, "decoder executors started");
        Ok(Self { executor, workers })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Close the scheduler, wait for the workers to finish their current job,
    /// then close the decoder pool
    pub fn shutdown(self) {
        self.executor.scheduler.close();

        for worker in self.workers {
            if worker.join().is_err() {
                warn!("decoder executor thread panicked");
            }
        }

        self.executor.pool.close();
        info!("decoder executors stopped");
    }
}
