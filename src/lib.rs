//! # Octafold - Real-time Octave Folding
//!
//! Captures a mono stream, folds spectral content above a cutoff down by octaves
//! into the band below it, and plays the result back.
//!
//! ## Architecture
//!
//! Octafold is an umbrella crate over:
//! - **octafold-core** - sample queues, spectral processor, capture/playback
//!   adapters, processing worker, CPAL device layer
//!
//! ## Quick Start
//!
//! ```ignore
//! use octafold::prelude::*;
//!
//! let engine = OctafoldEngine::builder()
//!     .sample_rate(44_100.0)
//!     .build()?;
//!
//! engine.start()?;
//! engine.feed(&input)?;
//! engine.flush();
//! engine.render(&mut output, 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Offline-driven engine
//! - `device` - CPAL input/output streams

/// Re-export of octafold-core for direct access
pub use octafold_core as core;

pub use octafold_core::{
    fold_octaves, fold_target, normalize, AtomicFlag, CaptureAdapter, FoldMode, MuteMode,
    Pipeline, PipelineBuilder, PipelineConfig, PipelineStats, PlaybackAdapter, SampleQueue,
    SpectralProcessor,
};

#[cfg(feature = "device")]
pub use octafold_core::{list_input_devices, list_output_devices, AudioDevices, DeviceConfig};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::OctafoldEngineBuilder;
pub use engine::OctafoldEngine;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{OctafoldEngine, OctafoldEngineBuilder};

    pub use crate::{FoldMode, MuteMode, PipelineConfig, PipelineStats};

    #[cfg(feature = "device")]
    pub use crate::DeviceConfig;
}
