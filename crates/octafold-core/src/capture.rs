//! Capture side: input device buffers into the raw queue.

use crate::context::PipelineContext;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Wake-up token for the processing worker.
pub(crate) type WakeSender = Sender<()>;

/// Receives hardware input buffers and hands them to the processing worker.
///
/// Runs on the input device's real-time thread: it copies into the raw queue,
/// raises the worker's wake signal with `try_send`, and returns. It never blocks,
/// and it only allocates when an interleaved buffer outgrows the scratch space.
pub struct CaptureAdapter {
    context: Arc<PipelineContext>,
    wake: WakeSender,
    scratch: Vec<f32>,
}

impl CaptureAdapter {
    pub(crate) fn new(
        context: Arc<PipelineContext>,
        wake: WakeSender,
        scratch_frames: usize,
    ) -> Self {
        Self {
            context,
            wake,
            scratch: Vec::with_capacity(scratch_frames),
        }
    }

    /// Push one mono input buffer of any length.
    ///
    /// A no-op while the pipeline is stopped. Samples that do not fit in the raw
    /// ring are counted as overflow.
    #[inline]
    pub fn on_capture_block(&self, samples: &[f32]) {
        let Some(_guard) = self.context.gate.enter() else {
            return;
        };

        let pushed = self.context.raw.push_slice(samples);
        if pushed < samples.len() {
            self.context
                .metrics
                .record_raw_overflow(samples.len() - pushed);
        }
        self.context.metrics.record_capture_block();

        // A full channel means a wake-up is already pending.
        let _ = self.wake.try_send(());
    }

    /// Push channel 0 of an interleaved buffer.
    pub fn on_capture_interleaved(&mut self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        self.scratch.clear();
        self.scratch.extend(data.chunks(channels).map(|frame| frame[0]));

        self.on_capture_block(&self.scratch);
    }

    /// Whether captured samples are currently accepted.
    pub fn is_accepting(&self) -> bool {
        self.context.gate.is_open()
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        self.context.capture_claimed.set(false);
    }
}
