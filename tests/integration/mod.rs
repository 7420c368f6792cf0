//! Integration test modules for Octafold
//!
//! - engine: lifecycle, configuration, restart
//! - flow: sample ordering and spectral folding through the whole pipeline
//! - backpressure: backlog ceiling, underflow, mute modes

pub mod backpressure;
pub mod engine;
