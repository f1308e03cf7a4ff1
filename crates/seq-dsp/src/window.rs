//! Symmetric window functions for spectrum analysis

use seq_core::{Sample, WindowFunction};
use std::f64::consts::PI;

/// Precomputed window coefficients
#[derive(Debug, Clone)]
pub struct WindowTable {
    kind: WindowFunction,
    coeffs: Vec<f64>,
}

impl WindowTable {
    /// Build a window of `size` points.
    ///
    /// With `normalize` the coefficients are scaled so they sum to `size`,
    /// giving unity coherent gain: a full-scale sine centred on a bin reads
    /// 0 dB after the analyzer's `2 / size` magnitude scaling.
    pub fn new(kind: WindowFunction, size: usize, normalize: bool) -> Self {
        let mut coeffs: Vec<f64> = (0..size).map(|i| window_value(kind, i, size)).collect();

        if normalize {
            let sum: f64 = coeffs.iter().sum();
            if sum > 0.0 {
                let scale = size as f64 / sum;
                coeffs.iter_mut().for_each(|c| *c *= scale);
            }
        }

        Self { kind, coeffs }
    }

    #[inline]
    pub fn kind(&self) -> WindowFunction {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Multiply `buffer` by the window in place
    #[inline]
    pub fn apply(&self, buffer: &mut [Sample]) {
        debug_assert_eq!(buffer.len(), self.coeffs.len());
        for (x, w) in buffer.iter_mut().zip(&self.coeffs) {
            *x *= w;
        }
    }
}

fn window_value(kind: WindowFunction, i: usize, size: usize) -> f64 {
    if size <= 1 {
        return 1.0;
    }
    let x = 2.0 * PI * i as f64 / (size - 1) as f64;
    match kind {
        WindowFunction::Rectangular => 1.0,
        WindowFunction::Hann => 0.5 - 0.5 * x.cos(),
        WindowFunction::Hamming => 0.54 - 0.46 * x.cos(),
        WindowFunction::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        WindowFunction::BlackmanHarris => {
            0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos() - 0.01168 * (3.0 * x).cos()
        }
    }
}
