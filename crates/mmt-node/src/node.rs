//! Node assembly: scheduler, decoder pool and worker threads

use crate::config::NodeConfig;
use mmt_decoder::{DecoderExecutor, DecoderPool, EchoDecoder, ExecutorPool, Translator};
use mmt_metrics::Metrics;
use mmt_scheduler::Scheduler;
use std::sync::Arc;
use std::time::Duration;

/// A running translation node
pub struct Node {
    config: NodeConfig,
    scheduler: Arc<Scheduler>,
    workers: ExecutorPool,
    metrics: Arc<Metrics>,
}

impl Node {
    /// Build the pipeline and start the decoder workers
    pub fn start(config: NodeConfig) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let scheduler = Arc::new(
            Scheduler::new(config.scheduler.clone())?.with_metrics(Arc::clone(&metrics)),
        );

        let delay = Duration::from_millis(config.decoder.delay_ms);
        let pool = DecoderPool::from_factory(config.decoder.threads, || {
            Box::new(EchoDecoder::with_delay(delay))
        });
        let executor = DecoderExecutor::new(Arc::clone(&scheduler), Arc::new(pool))
            .with_metrics(Arc::clone(&metrics));
        let workers = ExecutorPool::start(executor, config.decoder.threads)?;

        tracing::info!(
            policy = %config.scheduler.policy,
            queue_size = config.scheduler.queue_size,
            threads = config.decoder.threads,
            "Node started"
        );

        Ok(Self {
            config,
            scheduler,
            workers,
            metrics,
        })
    }

    /// Translator bound to this node's scheduler and request timeout
    pub fn translator(&self) -> Translator {
        let translator = Translator::new(Arc::clone(&self.scheduler));
        match self.config.translation.timeout() {
            Some(timeout) => translator.with_timeout(timeout),
            None => translator,
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Shared metrics registry
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Stop accepting requests and wait for the workers.
    ///
    /// Requests still queued fail with a shutdown error.
    pub fn shutdown(self) {
        tracing::info!(pending = self.scheduler.pending_len(), "Node stopping");
        self.workers.shutdown();
    }
}
