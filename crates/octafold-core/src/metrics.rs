//! Pipeline diagnostics.
//!
//! Counters are bumped from the real-time callbacks with `Relaxed` atomics; nothing
//! there logs or allocates. [`PipelineStats`] is a plain snapshot for the control
//! thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every pipeline stage.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Render pulls that found the processed queue empty
    underflows: AtomicU64,
    /// Processed samples discarded by the backlog ceiling
    dropped_samples: AtomicU64,
    /// Captured samples rejected because the raw ring was full
    raw_overflows: AtomicU64,
    blocks_processed: AtomicU64,
    worker_activations: AtomicU64,
    capture_blocks: AtomicU64,
    frames_rendered: AtomicU64,
    stream_errors: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_underflow(&self) {
        self.underflows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self, samples: usize) {
        self.dropped_samples.fetch_add(samples as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_raw_overflow(&self, samples: usize) {
        self.raw_overflows.fetch_add(samples as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_block_processed(&self) {
        self.blocks_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_activation(&self) {
        self.worker_activations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_capture_block(&self) {
        self.capture_blocks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frames(&self, frames: usize) {
        self.frames_rendered.fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Called from device error callbacks.
    #[inline]
    pub fn record_stream_error(&self) {
        self.stream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.underflows.store(0, Ordering::Relaxed);
        self.dropped_samples.store(0, Ordering::Relaxed);
        self.raw_overflows.store(0, Ordering::Relaxed);
        self.blocks_processed.store(0, Ordering::Relaxed);
        self.worker_activations.store(0, Ordering::Relaxed);
        self.capture_blocks.store(0, Ordering::Relaxed);
        self.frames_rendered.store(0, Ordering::Relaxed);
        self.stream_errors.store(0, Ordering::Relaxed);
    }

    /// Snapshot the counters together with the current queue lengths.
    pub fn snapshot(&self, raw_len: usize, processed_len: usize) -> PipelineStats {
        PipelineStats {
            underflows: self.underflows.load(Ordering::Relaxed),
            dropped_samples: self.dropped_samples.load(Ordering::Relaxed),
            raw_overflows: self.raw_overflows.load(Ordering::Relaxed),
            blocks_processed: self.blocks_processed.load(Ordering::Relaxed),
            worker_activations: self.worker_activations.load(Ordering::Relaxed),
            capture_blocks: self.capture_blocks.load(Ordering::Relaxed),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            stream_errors: self.stream_errors.load(Ordering::Relaxed),
            raw_len,
            processed_len,
        }
    }
}

/// Point-in-time view of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub underflows: u64,
    pub dropped_samples: u64,
    pub raw_overflows: u64,
    pub blocks_processed: u64,
    pub worker_activations: u64,
    pub capture_blocks: u64,
    pub frames_rendered: u64,
    pub stream_errors: u64,
    pub raw_len: usize,
    pub processed_len: usize,
}

impl PipelineStats {
    /// Samples captured but not yet played.
    pub fn lag_samples(&self) -> usize {
        self.raw_len + self.processed_len
    }
}
