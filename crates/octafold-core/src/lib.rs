//! Real-time octave-folding pipeline: capture → spectral fold → playback.
//!
//! # Primary API
//!
//! - [`Pipeline`] / [`PipelineBuilder`]: owns the queues and the processing worker
//! - [`CaptureAdapter`]: called from the input device callback
//! - [`PlaybackAdapter`]: called from the output device callback
//! - [`SpectralProcessor`]: the block transform on its own
//! - [`SampleQueue`]: lock-free sample FIFO with monotonic counters
//!
//! # Feature-gated APIs
//!
//! - `"device"`: CPAL input/output streams ([`AudioDevices`], [`DeviceConfig`])
//!
//! # Example
//!
//! ```ignore
//! use octafold_core::Pipeline;
//!
//! let pipeline = Pipeline::builder().sample_rate(48_000.0).build()?;
//! let capture = pipeline.capture_adapter()?;
//! let playback = pipeline.playback_adapter();
//!
//! pipeline.start()?;
//! capture.on_capture_block(&input);
//! playback.render_interleaved(&mut output, 2);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{FoldMode, MuteMode, PipelineConfig, MAX_QUEUE_SAMPLES};

pub(crate) mod lockfree;
pub use lockfree::AtomicFlag;

pub mod queue;
pub use queue::SampleQueue;

pub mod spectral;
pub use spectral::{fold_octaves, fold_target, normalize, SpectralProcessor};

pub mod metrics;
pub use metrics::{PipelineMetrics, PipelineStats};

mod context;

mod capture;
pub use capture::CaptureAdapter;

mod playback;
pub use playback::PlaybackAdapter;

mod worker;

mod pipeline;
pub use pipeline::{Pipeline, PipelineBuilder};

#[cfg(feature = "device")]
pub mod device;
#[cfg(feature = "device")]
pub use device::{list_input_devices, list_output_devices, AudioDevices, DeviceConfig};
