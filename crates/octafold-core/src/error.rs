//! Error types for octafold-core.

use thiserror::Error;

/// Error type for octafold-core operations.
///
/// Only control-plane calls return these. The capture and render callbacks never
/// fail; underflow and backlog drops are counted in [`crate::PipelineStats`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Capture adapter already claimed; the raw queue takes a single producer")]
    CaptureClaimed,

    #[error("Failed to spawn processing worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[cfg(feature = "device")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "device")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to pause audio stream")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "device")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
