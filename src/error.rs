//! Centralized error type for the octafold umbrella crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] octafold_core::Error),

    /// `feed` was called while the input device owns the capture side.
    #[error("Capture is driven by the input device")]
    DevicesActive,
}

pub type Result<T> = std::result::Result<T, Error>;
