//! Pipeline configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for `block_size`, `raw_capacity` and `max_backlog_samples`
/// (2^26 samples, about 25 minutes at 44.1 kHz).
pub const MAX_QUEUE_SAMPLES: usize = 1 << 26;

/// How a folded bin treats its own coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldMode {
    /// Add the bin into its fold target and keep it in place.
    ///
    /// High-frequency energy is duplicated downward rather than moved. This is the
    /// historical behavior of the effect and stays the default.
    #[default]
    Accumulate,
    /// Add the bin into its fold target, then zero it.
    Move,
}

/// What the render callback does with the processed queue while muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteMode {
    /// Pop one sample per frame and discard it, so the queue keeps draining.
    #[default]
    Drain,
    /// Leave the queue untouched. The worker's backlog ceiling bounds it.
    Freeze,
}

/// Configuration for the capture → fold → playback pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples per spectral block (N). Sets frequency resolution and latency.
    pub block_size: usize,
    /// Cutoff above which bins are folded.
    pub threshold_hz: f64,
    /// Half the sample rate.
    pub nyquist_hz: f64,
    /// Processed-queue ceiling enforced after every worker activation.
    pub max_backlog_samples: usize,
    /// Capacity of the raw capture ring. Rounded up to a power of two.
    pub raw_capacity: usize,
    pub fold_mode: FoldMode,
    pub mute_mode: MuteMode,
    /// Copy blocks through unchanged instead of folding them.
    pub bypass: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            threshold_hz: 3000.0,
            nyquist_hz: 22050.0,
            max_backlog_samples: 10_000,
            raw_capacity: 262_144,
            fold_mode: FoldMode::Accumulate,
            mute_mode: MuteMode::Drain,
            bypass: false,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with `nyquist_hz` taken from a device sample rate.
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self {
            nyquist_hz: sample_rate / 2.0,
            ..Default::default()
        }
    }

    /// Bin threshold `T = floor(threshold_hz * N / nyquist_hz)`.
    ///
    /// Fails when T falls outside `[0, N)`.
    pub fn bin_threshold(&self) -> Result<usize> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be at least 1".into()));
        }
        if !self.nyquist_hz.is_finite() || self.nyquist_hz <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "nyquist_hz {} must be a positive frequency",
                self.nyquist_hz
            )));
        }
        if !self.threshold_hz.is_finite() || self.threshold_hz < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "threshold_hz {} must be a non-negative frequency",
                self.threshold_hz
            )));
        }

        let t = (self.threshold_hz * self.block_size as f64 / self.nyquist_hz).floor();
        if t >= self.block_size as f64 {
            return Err(Error::InvalidConfig(format!(
                "bin threshold {} out of range (0-{}); threshold_hz {} exceeds nyquist_hz {}",
                t,
                self.block_size - 1,
                self.threshold_hz,
                self.nyquist_hz
            )));
        }
        Ok(t as usize)
    }

    pub fn validate(&self) -> Result<()> {
        self.bin_threshold()?;
        if self.block_size > MAX_QUEUE_SAMPLES {
            return Err(Error::InvalidConfig(format!(
                "block_size {} above the {} sample limit",
                self.block_size, MAX_QUEUE_SAMPLES
            )));
        }
        if self.raw_capacity < self.block_size {
            return Err(Error::InvalidConfig(format!(
                "raw_capacity {} smaller than block_size {}",
                self.raw_capacity, self.block_size
            )));
        }
        if self.raw_capacity > MAX_QUEUE_SAMPLES {
            return Err(Error::InvalidConfig(format!(
                "raw_capacity {} above the {} sample limit",
                self.raw_capacity, MAX_QUEUE_SAMPLES
            )));
        }
        if self.max_backlog_samples > MAX_QUEUE_SAMPLES {
            return Err(Error::InvalidConfig(format!(
                "max_backlog_samples {} above the {} sample limit",
                self.max_backlog_samples, MAX_QUEUE_SAMPLES
            )));
        }
        self.processed_capacity()?;
        Ok(())
    }

    /// Ring capacity for the processed queue: room for the backlog ceiling plus
    /// two blocks in flight, rounded up to a power of two.
    pub fn processed_capacity(&self) -> Result<usize> {
        self.block_size
            .checked_mul(2)
            .and_then(|blocks| blocks.checked_add(self.max_backlog_samples))
            .and_then(usize::checked_next_power_of_two)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "processed ring for max_backlog_samples {} and block_size {} overflows",
                    self.max_backlog_samples, self.block_size
                ))
            })
    }
}
