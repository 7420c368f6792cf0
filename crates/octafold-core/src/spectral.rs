//! Octave-folding spectral transform.
//!
//! One block goes through a type-II cosine transform, bins above the threshold are
//! folded down by octaves, and a type-III transform brings it back to the time
//! domain. The forward/inverse pair scales by `N/2`, which [`normalize`] removes.
//!
//! Both transforms run on an N-point complex FFT (Makhoul's reordering), planned
//! once per processor.

use crate::config::FoldMode;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Fold target for `bin`: halve until the index is at or below `threshold`.
///
/// `fold_target(100, 40) == 25`, and bins already at or below the threshold map
/// to themselves.
#[inline]
pub fn fold_target(bin: usize, threshold: usize) -> usize {
    let mut target = bin;
    while target > threshold {
        target /= 2;
    }
    target
}

/// Fold every bin above `threshold` into its octave target, ascending.
pub fn fold_octaves(coeffs: &mut [f32], threshold: usize, mode: FoldMode) {
    for bin in threshold.saturating_add(1)..coeffs.len() {
        let value = coeffs[bin];
        coeffs[fold_target(bin, threshold)] += value;
        if mode == FoldMode::Move {
            coeffs[bin] = 0.0;
        }
    }
}

/// Remove the `N/2` gain of the forward/inverse transform pair.
#[inline]
pub fn normalize(samples: &mut [f32], block_size: usize) {
    let scale = 2.0 / block_size as f32;
    for sample in samples.iter_mut() {
        *sample *= scale;
    }
}

/// Unnormalized DCT-II / DCT-III pair over a fixed length.
struct CosineTransform {
    len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// `e^{-iπk/2N}`
    twiddles: Vec<Complex<f32>>,
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl CosineTransform {
    fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        let twiddles = (0..len)
            .map(|k| {
                let angle = -PI * k as f64 / (2.0 * len as f64);
                Complex::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();

        Self {
            len,
            forward,
            inverse,
            twiddles,
            work: vec![Complex::new(0.0, 0.0); len],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// `X[k] = Σ x[n]·cos(πk(2n+1)/2N)`
    fn dct2(&mut self, input: &[f32], coeffs: &mut [f32]) {
        let n = self.len;
        for i in 0..(n + 1) / 2 {
            self.work[i] = Complex::new(input[2 * i], 0.0);
        }
        for i in 0..n / 2 {
            self.work[n - 1 - i] = Complex::new(input[2 * i + 1], 0.0);
        }

        self.forward.process_with_scratch(&mut self.work, &mut self.scratch);

        for (k, coeff) in coeffs.iter_mut().enumerate().take(n) {
            *coeff = (self.work[k] * self.twiddles[k]).re;
        }
    }

    /// `x[n] = X[0]/2 + Σ_{k≥1} X[k]·cos(πk(2n+1)/2N)`, i.e. `N/2` times the
    /// exact inverse of [`dct2`](Self::dct2).
    fn dct3(&mut self, coeffs: &[f32], output: &mut [f32]) {
        let n = self.len;
        for k in 0..n {
            let mirrored = if k == 0 { 0.0 } else { coeffs[n - k] };
            self.work[k] = Complex::new(coeffs[k], -mirrored) * self.twiddles[k].conj();
        }

        self.inverse.process_with_scratch(&mut self.work, &mut self.scratch);

        // The unnormalized inverse FFT carries a factor N; halving it leaves N/2.
        for i in 0..(n + 1) / 2 {
            output[2 * i] = self.work[i].re * 0.5;
        }
        for i in 0..n / 2 {
            output[2 * i + 1] = self.work[n - 1 - i].re * 0.5;
        }
    }
}

/// Block transform: forward DCT → octave folding → inverse DCT → normalization.
///
/// Holds reusable working buffers so repeated calls do not allocate.
pub struct SpectralProcessor {
    block_size: usize,
    bin_threshold: usize,
    fold_mode: FoldMode,
    transform: CosineTransform,
    coeffs: Vec<f32>,
}

impl SpectralProcessor {
    /// `block_size` must be non-zero. A `bin_threshold` of `block_size - 1` or
    /// more disables folding.
    pub fn new(block_size: usize, bin_threshold: usize) -> Self {
        Self {
            block_size,
            bin_threshold,
            fold_mode: FoldMode::default(),
            transform: CosineTransform::new(block_size),
            coeffs: vec![0.0; block_size],
        }
    }

    pub fn with_fold_mode(mut self, mode: FoldMode) -> Self {
        self.fold_mode = mode;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn bin_threshold(&self) -> usize {
        self.bin_threshold
    }

    pub fn fold_mode(&self) -> FoldMode {
        self.fold_mode
    }

    /// Forward transform only. Both slices must be `block_size` long.
    pub fn forward(&mut self, input: &[f32], coeffs: &mut [f32]) {
        debug_assert_eq!(input.len(), self.block_size);
        debug_assert_eq!(coeffs.len(), self.block_size);
        self.transform.dct2(input, coeffs);
    }

    /// Inverse transform only, without normalization.
    pub fn inverse(&mut self, coeffs: &[f32], output: &mut [f32]) {
        debug_assert_eq!(coeffs.len(), self.block_size);
        debug_assert_eq!(output.len(), self.block_size);
        self.transform.dct3(coeffs, output);
    }

    /// Run the whole transform on one block.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), self.block_size);
        debug_assert_eq!(output.len(), self.block_size);

        self.transform.dct2(input, &mut self.coeffs);
        fold_octaves(&mut self.coeffs, self.bin_threshold, self.fold_mode);
        self.transform.dct3(&self.coeffs, output);
        normalize(output, self.block_size);
    }
}
