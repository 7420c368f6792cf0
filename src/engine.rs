//! OctafoldEngine: a pipeline plus, optionally, the devices that drive it.

use crate::core::{CaptureAdapter, Pipeline, PipelineConfig, PipelineStats, PlaybackAdapter};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::time::Duration;

#[cfg(feature = "device")]
use crate::core::AudioDevices;

/// Octave-folding engine.
///
/// Without devices the engine is driven offline: [`feed`](Self::feed) pushes
/// input, [`render`](Self::render) pulls output and [`flush`](Self::flush) waits for
/// the worker to catch up. With the `device` feature and a device config, the input
/// and output streams drive the same pipeline and `feed` is rejected.
///
/// # Example
///
/// ```ignore
/// use octafold::prelude::*;
///
/// let engine = OctafoldEngine::builder()
///     .sample_rate(44_100.0)
///     .threshold_hz(3000.0)
///     .build()?;
///
/// engine.start()?;
/// engine.feed(&input)?;
/// engine.flush();
/// engine.render(&mut output, 1);
/// ```
pub struct OctafoldEngine {
    pipeline: Pipeline,
    /// `None` while the input device owns the capture side.
    capture: Mutex<Option<CaptureAdapter>>,
    playback: PlaybackAdapter,
    flush_timeout: Duration,

    #[cfg(feature = "device")]
    devices: Mutex<Option<AudioDevices>>,
}

impl OctafoldEngine {
    pub fn builder() -> crate::OctafoldEngineBuilder {
        crate::OctafoldEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        pipeline: Pipeline,
        flush_timeout: Duration,
        #[cfg(feature = "device")] devices: Option<AudioDevices>,
    ) -> Result<Self> {
        #[cfg(feature = "device")]
        let capture = if devices.is_some() {
            None
        } else {
            Some(pipeline.capture_adapter()?)
        };
        #[cfg(not(feature = "device"))]
        let capture = Some(pipeline.capture_adapter()?);

        let playback = pipeline.playback_adapter();

        Ok(Self {
            pipeline,
            capture: Mutex::new(capture),
            playback,
            flush_timeout,
            #[cfg(feature = "device")]
            devices: Mutex::new(devices),
        })
    }

    /// Start the pipeline, then the device streams if any.
    pub fn start(&self) -> Result<()> {
        self.pipeline.start()?;

        #[cfg(feature = "device")]
        if let Some(devices) = self.devices.lock().as_mut() {
            if let Err(err) = devices.play(&self.pipeline) {
                self.pipeline.stop();
                return Err(err.into());
            }
        }

        Ok(())
    }

    /// Close the device streams if any, then stop the pipeline.
    pub fn stop(&self) {
        #[cfg(feature = "device")]
        if let Some(devices) = self.devices.lock().as_mut() {
            devices.close();
        }

        self.pipeline.stop();
    }

    /// Pause the device streams without stopping the pipeline.
    #[cfg(feature = "device")]
    pub fn pause_devices(&self) -> Result<()> {
        if let Some(devices) = self.devices.lock().as_ref() {
            devices.pause()?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.pipeline.is_running()
    }

    /// Push mono input. Ignored while stopped.
    pub fn feed(&self, samples: &[f32]) -> Result<()> {
        let capture = self.capture.lock();
        let capture = capture.as_ref().ok_or(Error::DevicesActive)?;
        capture.on_capture_block(samples);
        Ok(())
    }

    /// Push channel 0 of interleaved input.
    pub fn feed_interleaved(&self, data: &[f32], channels: usize) -> Result<()> {
        let mut capture = self.capture.lock();
        let capture = capture.as_mut().ok_or(Error::DevicesActive)?;
        capture.on_capture_interleaved(data, channels);
        Ok(())
    }

    /// Pull interleaved output, one processed sample per frame on every channel.
    pub fn render(&self, output: &mut [f32], channels: usize) {
        self.playback.render_interleaved(output, channels);
    }

    pub fn render_planar(&self, output: &mut [&mut [f32]]) {
        self.playback.render_planar(output);
    }

    /// Wait until every complete block fed so far has been processed.
    ///
    /// Returns `false` if the worker did not catch up within the flush timeout.
    pub fn flush(&self) -> bool {
        self.pipeline.wait_idle(self.flush_timeout)
    }

    pub fn set_listening(&self, listening: bool) {
        self.pipeline.set_listening(listening);
    }

    pub fn is_listening(&self) -> bool {
        self.pipeline.is_listening()
    }

    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    pub fn bin_threshold(&self) -> usize {
        self.pipeline.bin_threshold()
    }

    pub fn sample_rate(&self) -> f64 {
        self.pipeline.config().nyquist_hz * 2.0
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[cfg(feature = "device")]
    pub fn has_devices(&self) -> bool {
        self.devices.lock().is_some()
    }
}

impl Drop for OctafoldEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
