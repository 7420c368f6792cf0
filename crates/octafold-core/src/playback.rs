//! Playback side: the output device pulls processed samples one frame at a time.

use crate::config::MuteMode;
use crate::context::PipelineContext;
use std::sync::Arc;

/// Serves the output device's render callback from the processed queue.
///
/// Every pull is a single lock-free `pop`. An empty queue yields silence and is
/// counted as an underflow; a stopped pipeline yields silence without touching the
/// queue.
#[derive(Clone)]
pub struct PlaybackAdapter {
    context: Arc<PipelineContext>,
    mute_mode: MuteMode,
}

impl PlaybackAdapter {
    pub(crate) fn new(context: Arc<PipelineContext>, mute_mode: MuteMode) -> Self {
        Self { context, mute_mode }
    }

    /// Next output sample. Caller holds the gate.
    #[inline]
    fn next_sample(&self) -> f32 {
        if !self.context.listening.get() {
            if self.mute_mode == MuteMode::Drain {
                let _ = self.context.processed.pop();
            }
            return 0.0;
        }

        match self.context.processed.pop() {
            Some(sample) => sample,
            None => {
                self.context.metrics.record_underflow();
                0.0
            }
        }
    }

    /// Pull one sample.
    #[inline]
    pub fn pull_sample(&self) -> f32 {
        let Some(_guard) = self.context.gate.enter() else {
            return 0.0;
        };
        self.context.metrics.record_frames(1);
        self.next_sample()
    }

    /// Fill `frame_index` of every output channel with one pulled sample.
    ///
    /// Channels shorter than `frame_index` are left alone.
    #[inline]
    pub fn on_render_frame(&self, output_channels: &mut [&mut [f32]], frame_index: usize) {
        let value = self.pull_sample();
        for channel in output_channels.iter_mut() {
            if let Some(slot) = channel.get_mut(frame_index) {
                *slot = value;
            }
        }
    }

    /// Fill a planar buffer set, one pull per frame.
    pub fn render_planar(&self, output_channels: &mut [&mut [f32]]) {
        let frames = output_channels.iter().map(|c| c.len()).max().unwrap_or(0);
        let guard = self.context.gate.enter();

        for frame in 0..frames {
            let value = if guard.is_some() { self.next_sample() } else { 0.0 };
            for channel in output_channels.iter_mut() {
                if let Some(slot) = channel.get_mut(frame) {
                    *slot = value;
                }
            }
        }

        if guard.is_some() {
            self.context.metrics.record_frames(frames);
        }
    }

    /// Fill an interleaved buffer, writing each pulled sample to every channel.
    pub fn render_interleaved(&self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let Some(_guard) = self.context.gate.enter() else {
            data.fill(0.0);
            return;
        };

        let mut frames = 0;
        for frame in data.chunks_mut(channels) {
            frame.fill(self.next_sample());
            frames += 1;
        }
        self.context.metrics.record_frames(frames);
    }
}
