//! Filter response curve evaluated analytically from the coefficient chain

use seq_core::{Decibels, MAX_DISPLAY_FREQ, MIN_DISPLAY_FREQ};
use seq_dsp::filter_chain::{CutChain, FilterStage};
use seq_dsp::{FilterChain, SharedChain};
use std::sync::Arc;

use crate::common::{DbRange, Path, Rect, map_to_log10};

#[inline]
fn stage_magnitude(stage: &FilterStage, freq: f64, sample_rate: f64) -> f64 {
    if stage.bypassed {
        1.0
    } else {
        stage.coeffs.magnitude_for_frequency(freq, sample_rate)
    }
}

#[inline]
fn cut_magnitude(cut: &CutChain, freq: f64, sample_rate: f64) -> f64 {
    if cut.bypassed {
        return 1.0;
    }
    cut.stages
        .iter()
        .map(|s| stage_magnitude(s, freq, sample_rate))
        .product()
}

/// Linear magnitude of the whole chain at `freq`.
///
/// A bypassed cascade contributes exactly 1 whatever its stages hold.
pub fn chain_magnitude(chain: &FilterChain, freq: f64, sample_rate: f64) -> f64 {
    cut_magnitude(&chain.low_cut, freq, sample_rate)
        * stage_magnitude(&chain.peak, freq, sample_rate)
        * cut_magnitude(&chain.high_cut, freq, sample_rate)
}

/// Frequency of display column `i` out of `width`
#[inline]
pub fn column_frequency(i: usize, width: usize) -> f64 {
    map_to_log10(i as f64 / width as f64, MIN_DISPLAY_FREQ, MAX_DISPLAY_FREQ)
}

/// Chain response in dB for `width` log-spaced columns
pub fn magnitudes_db(chain: &FilterChain, sample_rate: f64, width: usize) -> Vec<f64> {
    (0..width)
        .map(|i| {
            let mag = chain_magnitude(chain, column_frequency(i, width), sample_rate);
            Decibels::from_gain(mag).0
        })
        .collect()
}

/// Response polyline, one vertex per pixel column of `bounds`
pub fn compute_response_curve(chain: &FilterChain, sample_rate: f64, bounds: Rect) -> Path {
    let mut path = Path::with_capacity(bounds.width.max(0.0) as usize);
    fill_response_curve(chain, sample_rate, bounds, &mut path);
    path
}

/// Same as [`compute_response_curve`], reusing `path`'s storage
pub fn fill_response_curve(chain: &FilterChain, sample_rate: f64, bounds: Rect, path: &mut Path) {
    path.clear();
    let width = bounds.width.max(0.0) as usize;
    for i in 0..width {
        let mag = chain_magnitude(chain, column_frequency(i, width), sample_rate);
        let y = DbRange::DISPLAY.to_y(Decibels::from_gain(mag).0, &bounds);
        path.line_to(bounds.left() + i as f64, y);
    }
}

/// Display-side copy of the chain plus its cached curve.
///
/// [`tick`](Self::tick) runs on the display timer: it consumes the shared
/// change flag and only re-evaluates when coefficients or bounds moved.
pub struct ResponseCurve {
    shared: Arc<SharedChain>,
    chain: FilterChain,
    sample_rate: f64,
    bounds: Rect,
    path: Path,
}

impl ResponseCurve {
    pub fn new(shared: Arc<SharedChain>, sample_rate: f64) -> Self {
        Self {
            shared,
            chain: FilterChain::default(),
            sample_rate,
            bounds: Rect::default(),
            path: Path::new(),
        }
    }

    /// Returns true when the curve was recomputed
    pub fn tick(&mut self, bounds: Rect) -> bool {
        let changed = self.shared.changed().take();
        if changed {
            match self.shared.try_snapshot() {
                Some(chain) => self.chain = chain,
                // Writer busy; look again next frame
                None => self.shared.changed().mark(),
            }
        }

        if !changed && bounds == self.bounds {
            return false;
        }
        self.bounds = bounds;
        fill_response_curve(&self.chain, self.sample_rate, bounds, &mut self.path);
        true
    }

    /// Rate change invalidates the cached curve
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.bounds = Rect::default();
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Response in dB at one frequency of the display chain
    pub fn gain_db_at(&self, freq: f64) -> f64 {
        Decibels::from_gain(chain_magnitude(&self.chain, freq, self.sample_rate)).0
    }
}
