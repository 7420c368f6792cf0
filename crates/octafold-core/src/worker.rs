//! Processing worker: raw queue → spectral fold → processed queue.

use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::lockfree::AtomicFlag;
use crate::spectral::SpectralProcessor;
use crate::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;

/// Upper bound on how long the worker sleeps without checking for shutdown.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// One serial processing stage. Owns the processor and its block buffers.
pub(crate) struct ProcessingWorker {
    context: Arc<PipelineContext>,
    processor: SpectralProcessor,
    max_backlog: usize,
    bypass: bool,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl ProcessingWorker {
    pub(crate) fn new(
        context: Arc<PipelineContext>,
        config: &PipelineConfig,
        bin_threshold: usize,
    ) -> Self {
        let block_size = config.block_size;
        Self {
            context,
            processor: SpectralProcessor::new(block_size, bin_threshold)
                .with_fold_mode(config.fold_mode),
            max_backlog: config.max_backlog_samples,
            bypass: config.bypass,
            input: vec![0.0; block_size],
            output: vec![0.0; block_size],
        }
    }

    /// One activation: process every complete block, then apply the backlog ceiling.
    ///
    /// Returns the number of blocks processed.
    pub(crate) fn run_once(&mut self) -> usize {
        let context = &self.context;
        let block_size = self.input.len();
        context.worker_busy.set(true);
        context.metrics.record_activation();

        let mut blocks = 0;
        while context.raw.len() >= block_size {
            if !context.raw.pop_block_into(&mut self.input) {
                break;
            }

            if self.bypass {
                self.output.copy_from_slice(&self.input);
            } else {
                self.processor.process(&self.input, &mut self.output);
            }

            // A long drain can outrun the ring before the ceiling applies below;
            // make room by dropping the oldest output.
            let vacant = context.processed.vacant();
            if vacant < block_size {
                let dropped = context.processed.discard(block_size - vacant);
                context.metrics.record_dropped(dropped);
            }
            context.processed.push_slice(&self.output);
            context.metrics.record_block_processed();
            blocks += 1;
        }

        loop {
            let len = context.processed.len();
            if len <= self.max_backlog {
                break;
            }
            let dropped = context.processed.discard(len - self.max_backlog);
            context.metrics.record_dropped(dropped);
        }

        context.worker_busy.set(false);
        blocks
    }
}

/// Handle to the dedicated worker thread.
pub(crate) struct WorkerThread {
    shutdown: Arc<AtomicFlag>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerThread {
    pub(crate) fn spawn(mut worker: ProcessingWorker, wake: Receiver<()>) -> Result<Self> {
        let shutdown = Arc::new(AtomicFlag::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("octafold-worker".into())
            .spawn(move || {
                let priority = thread_priority::set_current_thread_priority(ThreadPriority::Max);
                if let Err(err) = priority {
                    tracing::debug!("worker priority unchanged: {err:?}");
                }
                tracing::debug!("processing worker started");

                while !flag.get() {
                    match wake.recv_timeout(IDLE_POLL) {
                        Ok(()) | Err(RecvTimeoutError::Timeout) => {
                            if flag.get() {
                                break;
                            }
                            worker.run_once();
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::debug!("processing worker exiting");
            })
            .map_err(Error::WorkerSpawn)?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signal shutdown and join. An activation in progress runs to completion.
    pub(crate) fn stop(&mut self) {
        self.shutdown.set(true);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("processing worker panicked");
            }
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop();
    }
}
