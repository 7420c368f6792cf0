//! Test helpers for Octafold integration tests.
//!
//! The engines built here never open audio devices: input is fed and output is
//! rendered by hand, one cycle at a time.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Bypass and queue transfer
//! - `ROUND_TRIP_EPSILON` (1e-4): Transform round trip with folding disabled
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use octafold::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const TEST_SAMPLE_RATE: f64 = 44100.0;

pub const TEST_BLOCK_SIZE: usize = 512;

/// Offline engine with default settings, already started.
pub fn test_engine() -> OctafoldEngine {
    let engine = OctafoldEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .build()
        .expect("Failed to create test engine");
    engine.start().expect("Failed to start test engine");
    engine
}

/// Offline engine with `nyquist_hz == block_size`, so `threshold_hz` maps
/// directly onto the bin threshold T.
pub fn engine_with_bin_threshold(bin_threshold: usize) -> OctafoldEngine {
    let config = PipelineConfig {
        block_size: TEST_BLOCK_SIZE,
        nyquist_hz: TEST_BLOCK_SIZE as f64,
        threshold_hz: bin_threshold as f64,
        ..Default::default()
    };
    let engine = OctafoldEngine::builder()
        .config(config)
        .build()
        .expect("Failed to create test engine");
    assert_eq!(engine.bin_threshold(), bin_threshold);
    engine.start().expect("Failed to start test engine");
    engine
}

/// Feed `input`, wait for the worker, then pull every processed sample (mono).
pub fn process_offline(engine: &OctafoldEngine, input: &[f32]) -> Vec<f32> {
    engine.feed(input).expect("feed failed");
    assert!(engine.flush(), "worker did not catch up");
    drain(engine)
}

/// Pull everything currently in the processed queue.
pub fn drain(engine: &OctafoldEngine) -> Vec<f32> {
    let mut output = vec![0.0; engine.stats().processed_len];
    engine.render(&mut output, 1);
    output
}

pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Seeded white noise in -1..1.
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Linear ramp from start to end value.
pub fn generate_ramp(start: f32, end: f32, num_samples: usize) -> Vec<f32> {
    if num_samples <= 1 {
        return vec![start; num_samples];
    }
    let step = (end - start) / (num_samples - 1) as f32;
    (0..num_samples).map(|i| start + step * i as f32).collect()
}

/// Integer staircase [1, 2, ..., n]. Starts at 1 so underflow silence is
/// distinguishable from real samples.
pub fn generate_staircase(num_samples: usize) -> Vec<f32> {
    (1..=num_samples).map(|i| i as f32).collect()
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Result of comparing two audio buffers.
#[derive(Debug, Clone)]
pub struct AudioComparisonResult {
    pub equal: bool,
    pub max_diff: f32,
    pub first_diff_sample: Option<usize>,
    pub num_diffs: usize,
}

pub fn compare_audio(a: &[f32], b: &[f32], epsilon: f32) -> AudioComparisonResult {
    if a.len() != b.len() {
        return AudioComparisonResult {
            equal: false,
            max_diff: f32::MAX,
            first_diff_sample: Some(0),
            num_diffs: a.len().max(b.len()),
        };
    }

    let mut max_diff: f32 = 0.0;
    let mut first_diff = None;
    let mut num_diffs = 0;

    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        let diff = (x - y).abs();
        max_diff = max_diff.max(diff);
        if diff > epsilon {
            num_diffs += 1;
            first_diff.get_or_insert(i);
        }
    }

    AudioComparisonResult {
        equal: num_diffs == 0,
        max_diff,
        first_diff_sample: first_diff,
        num_diffs,
    }
}

/// Assert two signals are equal within tolerance, with detailed error message.
pub fn assert_signals_equal(a: &[f32], b: &[f32], epsilon: f32, context: &str) {
    let result = compare_audio(a, b, epsilon);
    assert!(
        result.equal,
        "{}: Signals differ - first diff at sample {:?}, max_diff={:.6}, num_diffs={}",
        context,
        result.first_diff_sample,
        result.max_diff,
        result.num_diffs
    );
}

pub fn assert_is_silent(samples: &[f32], threshold: f32, context: &str) {
    let max_val = peak(samples);
    assert!(
        max_val <= threshold,
        "{}: Expected silence (threshold {}), but peak was {}",
        context,
        threshold,
        max_val
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sine() {
        let samples = generate_sine(440.0, 44100.0, 44100);
        assert_eq!(samples.len(), 44100);
        assert!(rms(&samples) > 0.5);
        assert!(peak(&samples) <= 1.0);
    }

    #[test]
    fn test_noise_is_reproducible() {
        assert_eq!(generate_noise(64, 7), generate_noise(64, 7));
        assert!(peak(&generate_noise(1024, 7)) <= 1.0);
    }

    #[test]
    fn test_compare_audio() {
        let a = vec![0.0, 0.5, 1.0];
        let b = vec![0.001, 0.501, 0.999];
        assert!(compare_audio(&a, &b, 0.01).equal);
        let strict = compare_audio(&a, &b, 0.0001);
        assert_eq!(strict.num_diffs, 3);
        assert_eq!(strict.first_diff_sample, Some(0));
    }
}
