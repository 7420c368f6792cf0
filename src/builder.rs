//! Builder for configuring and constructing an `OctafoldEngine`.

use crate::core::{FoldMode, MuteMode, Pipeline, PipelineConfig};
use crate::{OctafoldEngine, Result};
use std::time::Duration;

#[cfg(feature = "device")]
use crate::core::{AudioDevices, DeviceConfig};

const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// With devices enabled, the sample rate is taken from the output device and
/// `sample_rate()` is ignored. Use `engine.sample_rate()` after building to query
/// the actual rate.
///
/// # Example
///
/// ```ignore
/// use octafold::prelude::*;
///
/// let engine = OctafoldEngine::builder()
///     .block_size(1024)
///     .threshold_hz(2500.0)
///     .fold_mode(FoldMode::Move)
///     .build()?;
/// ```
pub struct OctafoldEngineBuilder {
    config: PipelineConfig,
    flush_timeout: Duration,

    #[cfg(feature = "device")]
    devices: Option<DeviceConfig>,
}

impl Default for OctafoldEngineBuilder {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,

            #[cfg(feature = "device")]
            devices: None,
        }
    }
}

impl OctafoldEngineBuilder {
    /// Replace the whole pipeline config, e.g. one loaded from a file.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 512
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    /// Default: 3000 Hz
    pub fn threshold_hz(mut self, threshold_hz: f64) -> Self {
        self.config.threshold_hz = threshold_hz;
        self
    }

    /// Default: 44100 Hz
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.nyquist_hz = sample_rate / 2.0;
        self
    }

    /// Default: 10_000
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

    /// Upper bound for [`OctafoldEngine::flush`]. Default: 2 s
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Drive the engine from hardware.
    #[cfg(feature = "device")]
    pub fn devices(mut self, config: DeviceConfig) -> Self {
        self.devices = Some(config);
        self
    }

    /// Enables devices with the default output.
    #[cfg(feature = "device")]
    pub fn input_device(mut self, index: usize) -> Self {
        self.devices.get_or_insert_with(DeviceConfig::default).input_device = Some(index);
        self
    }

    /// Enables devices with the default input.
    #[cfg(feature = "device")]
    pub fn output_device(mut self, index: usize) -> Self {
        self.devices.get_or_insert_with(DeviceConfig::default).output_device = Some(index);
        self
    }

    pub fn build(self) -> Result<OctafoldEngine> {
        #[allow(unused_mut)]
        let mut config = self.config;

        #[cfg(feature = "device")]
        let devices = match self.devices {
            Some(device_config) => {
                let devices = AudioDevices::open(&device_config)?;
                config.nyquist_hz = devices.sample_rate() / 2.0;
                Some(devices)
            }
            None => None,
        };

        let pipeline = Pipeline::new(config)?;

        OctafoldEngine::from_parts(
            pipeline,
            self.flush_timeout,
            #[cfg(feature = "device")]
            devices,
        )
    }
}
