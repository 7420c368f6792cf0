//! Pipeline: owns the queues, the worker thread and the control surface.

use crate::capture::CaptureAdapter;
use crate::config::{FoldMode, MuteMode, PipelineConfig};
use crate::context::PipelineContext;
use crate::metrics::PipelineStats;
use crate::playback::PlaybackAdapter;
use crate::queue::SampleQueue;
use crate::worker::{ProcessingWorker, WorkerThread};
use crate::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interleaved capture buffers up to this many frames never allocate.
const CAPTURE_SCRATCH_FRAMES: usize = 8192;

/// Capture → fold → playback pipeline.
///
/// Queues are allocated once here and reset on every start. Adapters handed out by
/// [`capture_adapter`](Self::capture_adapter) and
/// [`playback_adapter`](Self::playback_adapter) stay valid across stop/start
/// cycles; while stopped they are no-ops (capture) or render silence (playback).
pub struct Pipeline {
    config: PipelineConfig,
    bin_threshold: usize,
    context: Arc<PipelineContext>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    worker: Mutex<Option<WorkerThread>>,
}

impl Pipeline {
    /// Validate `config` and allocate the queues. No thread is started.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let bin_threshold = config.bin_threshold()?;
        tracing::debug!(
            block_size = config.block_size,
            bin_threshold,
            "derived bin threshold from {} Hz / {} Hz",
            config.threshold_hz,
            config.nyquist_hz
        );

        let context = Arc::new(PipelineContext::new(
            config.raw_capacity,
            config.processed_capacity()?,
        ));
        let (wake_tx, wake_rx) = bounded(1);

        Ok(Self {
            config,
            bin_threshold,
            context,
            wake_tx,
            wake_rx,
            worker: Mutex::new(None),
        })
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Reset queues and counters, spawn the worker and start accepting callbacks.
    ///
    /// Does nothing if already running.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        self.context.reset();
        while self.wake_rx.try_recv().is_ok() {}

        let processing =
            ProcessingWorker::new(Arc::clone(&self.context), &self.config, self.bin_threshold);
        *worker = Some(WorkerThread::spawn(processing, self.wake_rx.clone())?);
        self.context.gate.open();

        tracing::info!(
            block_size = self.config.block_size,
            bin_threshold = self.bin_threshold,
            max_backlog = self.config.max_backlog_samples,
            "pipeline started"
        );
        Ok(())
    }

    /// Stop accepting callbacks, join the worker and empty both queues.
    ///
    /// Returns once no capture or render callback is inside the pipeline. Counters
    /// are kept until the next start.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        let Some(mut thread) = worker.take() else {
            return;
        };

        self.context.gate.close_and_wait();
        thread.stop();
        self.context.raw.reset();
        self.context.processed.reset();
        self.context.worker_busy.set(false);

        tracing::info!("pipeline stopped");
    }

    pub fn is_running(&self) -> bool {
        self.context.gate.is_open()
    }

    /// Claim the capture side. Only one adapter may be live at a time; dropping it
    /// releases the claim.
    pub fn capture_adapter(&self) -> Result<CaptureAdapter> {
        if self.context.capture_claimed.swap(true) {
            return Err(Error::CaptureClaimed);
        }
        Ok(CaptureAdapter::new(
            Arc::clone(&self.context),
            self.wake_tx.clone(),
            CAPTURE_SCRATCH_FRAMES,
        ))
    }

    pub fn playback_adapter(&self) -> PlaybackAdapter {
        PlaybackAdapter::new(Arc::clone(&self.context), self.config.mute_mode)
    }

    /// Gate playback output. Independent of start/stop.
    pub fn set_listening(&self, listening: bool) {
        self.context.listening.set(listening);
    }

    pub fn is_listening(&self) -> bool {
        self.context.listening.get()
    }

    pub fn stats(&self) -> PipelineStats {
        self.context
            .metrics
            .snapshot(self.context.raw.len(), self.context.processed.len())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bin_threshold(&self) -> usize {
        self.bin_threshold
    }

    pub fn raw_queue(&self) -> &SampleQueue {
        &self.context.raw
    }

    pub fn processed_queue(&self) -> &SampleQueue {
        &self.context.processed
    }

    #[cfg(feature = "device")]
    pub(crate) fn context_handle(&self) -> Arc<PipelineContext> {
        Arc::clone(&self.context)
    }

    /// Block until the worker has consumed every complete block in the raw queue.
    ///
    /// Returns `false` on timeout or if the pipeline is stopped with a block still
    /// pending.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let block_size = self.config.block_size;
        let _ = self.wake_tx.try_send(());

        loop {
            if self.context.raw.len() < block_size && !self.context.worker_busy.get() {
                return true;
            }
            if !self.is_running() || Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fluent builder for [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    pub fn threshold_hz(mut self, threshold_hz: f64) -> Self {
        self.config.threshold_hz = threshold_hz;
        self
    }

    pub fn nyquist_hz(mut self, nyquist_hz: f64) -> Self {
        self.config.nyquist_hz = nyquist_hz;
        self
    }

    /// Shorthand for `nyquist_hz(sample_rate / 2.0)`.
    pub fn sample_rate(self, sample_rate: f64) -> Self {
        self.nyquist_hz(sample_rate / 2.0)
    }

    pub fn max_backlog_samples(mut self, samples: usize) -> Self {
        self.config.max_backlog_samples = samples;
        self
    }

    pub fn raw_capacity(mut self, samples: usize) -> Self {
        self.config.raw_capacity = samples;
        self
    }

    pub fn fold_mode(mut self, mode: FoldMode) -> Self {
        self.config.fold_mode = mode;
        self
    }

    pub fn mute_mode(mut self, mode: MuteMode) -> Self {
        self.config.mute_mode = mode;
        self
    }

    pub fn bypass(mut self, bypass: bool) -> Self {
        self.config.bypass = bypass;
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.config)
    }
}
