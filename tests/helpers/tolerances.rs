//! Tolerance constants for pipeline tests.

/// Exact paths (bypass, queue transfer) should match to rounding.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// DCT-II → DCT-III → normalize on a 512-sample block.
pub const ROUND_TRIP_EPSILON: f32 = 1e-4;

/// Smallest coefficient difference counted as a real spectral change.
pub const SPECTRAL_CHANGE: f32 = 1e-2;

/// Values below this are considered silent (~-80dB).
pub const SILENCE_THRESHOLD: f32 = 0.0001;
