//! State shared between the control thread, the device callbacks and the worker.

use crate::lockfree::{AtomicFlag, CallbackGate};
use crate::metrics::PipelineMetrics;
use crate::queue::SampleQueue;

/// Everything the three execution contexts touch.
///
/// The raw queue has one producer (capture) and one consumer (worker). The
/// processed queue has one producer (worker); playback pops from it and the
/// worker's backlog policy discards from it.
pub(crate) struct PipelineContext {
    pub(crate) raw: SampleQueue,
    pub(crate) processed: SampleQueue,
    pub(crate) metrics: PipelineMetrics,
    pub(crate) listening: AtomicFlag,
    /// Set for the duration of a worker activation.
    pub(crate) worker_busy: AtomicFlag,
    /// Held by the one live [`crate::CaptureAdapter`].
    pub(crate) capture_claimed: AtomicFlag,
    /// Open while the pipeline is running.
    pub(crate) gate: CallbackGate,
}

impl PipelineContext {
    pub(crate) fn new(raw_capacity: usize, processed_capacity: usize) -> Self {
        Self {
            raw: SampleQueue::with_capacity(raw_capacity),
            processed: SampleQueue::with_capacity(processed_capacity),
            metrics: PipelineMetrics::new(),
            listening: AtomicFlag::new(true),
            worker_busy: AtomicFlag::new(false),
            capture_claimed: AtomicFlag::new(false),
            gate: CallbackGate::default(),
        }
    }

    /// Zero queues and counters. Callers close the gate and join the worker first.
    pub(crate) fn reset(&self) {
        self.raw.reset();
        self.processed.reset();
        self.metrics.reset();
        self.worker_busy.set(false);
    }
}
