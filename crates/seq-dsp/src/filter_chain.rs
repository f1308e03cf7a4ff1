//! Filter-coefficient engine and the processing chain it drives
//!
//! Chain layout is fixed: low-cut cascade, peak, high-cut cascade. Each cut
//! cascade always holds [`MAX_CUT_STAGES`] sections; a slope below 48 dB/oct
//! bypasses the trailing sections and gives them unity coefficients, so stage
//! indices never move.

use seq_core::{ChainSettings, Sample, Slope};
use std::f64::consts::PI;

use crate::biquad::{BiquadCoeffs, BiquadTDF2};
use crate::{MonoProcessor, Processor};

/// Second-order sections per cut cascade (48 dB/octave)
pub const MAX_CUT_STAGES: usize = 4;

/// Lowest frequency accepted by the designers
pub const MIN_FILTER_FREQ: f64 = 1.0;
/// Designers never go above this fraction of the sample rate
const MAX_FREQ_RATIO: f64 = 0.499;
pub const MIN_Q: f64 = 0.01;
pub const MAX_Q: f64 = 100.0;
const MAX_GAIN_DB: f64 = 48.0;
const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// One biquad section and its bypass flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStage {
    pub coeffs: BiquadCoeffs,
    pub bypassed: bool,
}

impl FilterStage {
    pub const UNITY: Self = Self {
        coeffs: BiquadCoeffs::bypass(),
        bypassed: false,
    };

    pub const BYPASSED: Self = Self {
        coeffs: BiquadCoeffs::bypass(),
        bypassed: true,
    };
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Four-section Butterworth cascade plus a cascade-level bypass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutChain {
    pub stages: [FilterStage; MAX_CUT_STAGES],
    pub bypassed: bool,
}

impl CutChain {
    /// Every section unity and bypassed
    pub const fn identity() -> Self {
        Self {
            stages: [FilterStage::BYPASSED; MAX_CUT_STAGES],
            bypassed: false,
        }
    }

    /// Number of sections currently contributing
    pub fn active_stages(&self) -> usize {
        self.stages.iter().filter(|s| !s.bypassed).count()
    }
}

impl Default for CutChain {
    fn default() -> Self {
        Self::identity()
    }
}

/// Coefficients and bypass flags for the whole chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterChain {
    pub low_cut: CutChain,
    pub peak: FilterStage,
    pub high_cut: CutChain,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self {
            low_cut: CutChain::identity(),
            peak: FilterStage::UNITY,
            high_cut: CutChain::identity(),
        }
    }
}

impl FilterChain {
    /// Design the full chain for `settings`
    pub fn from_settings(settings: &ChainSettings, sample_rate: f64) -> Self {
        let mut chain = Self::default();
        chain.update(settings, sample_rate);
        chain
    }

    /// Redesign in place
    pub fn update(&mut self, settings: &ChainSettings, sample_rate: f64) {
        self.peak = FilterStage {
            coeffs: make_peak_filter(settings, sample_rate),
            bypassed: settings.peak_bypassed,
        };

        let low = make_low_cut_filter(settings, sample_rate);
        update_cut_filter(&mut self.low_cut, &low, settings.low_cut_slope);
        self.low_cut.bypassed = settings.low_cut_bypassed;

        let high = make_high_cut_filter(settings, sample_rate);
        update_cut_filter(&mut self.high_cut, &high, settings.high_cut_slope);
        self.high_cut.bypassed = settings.high_cut_bypassed;
    }

    /// Every stage in processing order
    pub fn stages(&self) -> impl Iterator<Item = &FilterStage> {
        self.low_cut
            .stages
            .iter()
            .chain(std::iter::once(&self.peak))
            .chain(self.high_cut.stages.iter())
    }

    pub fn is_finite(&self) -> bool {
        self.stages().all(|s| s.coeffs.is_finite())
    }
}

#[inline]
fn sanitize_sample_rate(sample_rate: f64) -> f64 {
    if sample_rate > 0.0 && sample_rate.is_finite() {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

#[inline]
fn sanitize_freq(freq: f64, sample_rate: f64) -> f64 {
    // Nyquist wins over the lower bound at very low rates
    let max = sample_rate * MAX_FREQ_RATIO;
    if freq.is_nan() {
        1000.0_f64.min(max)
    } else {
        freq.max(MIN_FILTER_FREQ).min(max)
    }
}

#[inline]
fn sanitize_q(q: f64) -> f64 {
    if q.is_nan() { 1.0 } else { q.clamp(MIN_Q, MAX_Q) }
}

/// Peak section for the current settings (unity if the design degenerates)
pub fn make_peak_filter(settings: &ChainSettings, sample_rate: f64) -> BiquadCoeffs {
    let sample_rate = sanitize_sample_rate(sample_rate);
    let freq = sanitize_freq(settings.peak_freq, sample_rate);
    let q = sanitize_q(settings.peak_quality);
    let gain_db = if settings.peak_gain_db.is_finite() {
        settings.peak_gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB)
    } else {
        0.0
    };

    BiquadCoeffs::peaking(freq, q, 10.0_f64.powf(gain_db / 20.0), sample_rate).or_unity()
}

/// High-pass cascade for the low-cut section
pub fn make_low_cut_filter(
    settings: &ChainSettings,
    sample_rate: f64,
) -> [BiquadCoeffs; MAX_CUT_STAGES] {
    butterworth_cascade(
        CutKind::HighPass,
        settings.low_cut_freq,
        settings.low_cut_slope.order(),
        sample_rate,
    )
}

/// Low-pass cascade for the high-cut section
pub fn make_high_cut_filter(
    settings: &ChainSettings,
    sample_rate: f64,
) -> [BiquadCoeffs; MAX_CUT_STAGES] {
    butterworth_cascade(
        CutKind::LowPass,
        settings.high_cut_freq,
        settings.high_cut_slope.order(),
        sample_rate,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    HighPass,
    LowPass,
}

/// Q of the k-th (1-based) pole pair of an order-`n` Butterworth filter
#[inline]
pub fn butterworth_q(k: usize, n: usize) -> f64 {
    1.0 / (2.0 * ((2 * k - 1) as f64 * PI / (2 * n) as f64).sin())
}

/// Order-`2 * sections` Butterworth design split into biquads.
///
/// Slots past `sections` are unity.
pub fn butterworth_cascade(
    kind: CutKind,
    freq: f64,
    sections: usize,
    sample_rate: f64,
) -> [BiquadCoeffs; MAX_CUT_STAGES] {
    let sample_rate = sanitize_sample_rate(sample_rate);
    let freq = sanitize_freq(freq, sample_rate);
    let sections = sections.clamp(1, MAX_CUT_STAGES);
    let order = 2 * sections;

    let mut out = [BiquadCoeffs::bypass(); MAX_CUT_STAGES];
    for (k, slot) in out.iter_mut().enumerate().take(sections) {
        let q = butterworth_q(k + 1, order);
        *slot = match kind {
            CutKind::HighPass => BiquadCoeffs::highpass(freq, q, sample_rate),
            CutKind::LowPass => BiquadCoeffs::lowpass(freq, q, sample_rate),
        }
        .or_unity();
    }
    out
}

/// Load a cascade: the first `slope.order()` sections take `coeffs`, the
/// rest are bypassed with unity coefficients.
pub fn update_cut_filter(cut: &mut CutChain, coeffs: &[BiquadCoeffs; MAX_CUT_STAGES], slope: Slope) {
    let active = slope.order();
    for (i, stage) in cut.stages.iter_mut().enumerate() {
        if i < active {
            stage.coeffs = coeffs[i];
            stage.bypassed = false;
        } else {
            *stage = FilterStage::BYPASSED;
        }
    }
}

/// Stateful mono filter chain used on the audio thread
#[derive(Debug, Clone)]
pub struct MonoChain {
    layout: FilterChain,
    low_cut: [BiquadTDF2; MAX_CUT_STAGES],
    peak: BiquadTDF2,
    high_cut: [BiquadTDF2; MAX_CUT_STAGES],
}

impl MonoChain {
    pub fn new() -> Self {
        Self {
            layout: FilterChain::default(),
            low_cut: Default::default(),
            peak: BiquadTDF2::new(),
            high_cut: Default::default(),
        }
    }

    /// Take new coefficients and bypass flags; filter state is kept
    pub fn apply(&mut self, chain: &FilterChain) {
        self.layout = *chain;
        for (filter, stage) in self.low_cut.iter_mut().zip(&chain.low_cut.stages) {
            filter.set_coeffs(stage.coeffs);
        }
        self.peak.set_coeffs(chain.peak.coeffs);
        for (filter, stage) in self.high_cut.iter_mut().zip(&chain.high_cut.stages) {
            filter.set_coeffs(stage.coeffs);
        }
    }
}

impl Default for MonoChain {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
fn process_cut(filters: &mut [BiquadTDF2; MAX_CUT_STAGES], cut: &CutChain, mut x: Sample) -> Sample {
    if cut.bypassed {
        return x;
    }
    for (filter, stage) in filters.iter_mut().zip(&cut.stages) {
        if !stage.bypassed {
            x = filter.process_sample(x);
        }
    }
    x
}

impl Processor for MonoChain {
    fn reset(&mut self) {
        self.low_cut.iter_mut().for_each(|f| f.reset());
        self.peak.reset();
        self.high_cut.iter_mut().for_each(|f| f.reset());
    }
}

impl MonoProcessor for MonoChain {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let mut x = process_cut(&mut self.low_cut, &self.layout.low_cut, input);
        if !self.layout.peak.bypassed {
            x = self.peak.process_sample(x);
        }
        process_cut(&mut self.high_cut, &self.layout.high_cut, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: f64 = 48000.0;

    #[test]
    fn test_butterworth_q_values() {
        assert_relative_eq!(butterworth_q(1, 2), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(butterworth_q(1, 4), 1.306_562_964_876_377, epsilon = 1e-9);
        assert_relative_eq!(butterworth_q(2, 4), 0.541_196_100_146_197, epsilon = 1e-9);
    }

    #[test]
    fn test_unused_sections_are_unity_and_bypassed() {
        let settings = ChainSettings {
            low_cut_slope: Slope::Db24,
            high_cut_slope: Slope::Db12,
            ..ChainSettings::default()
        };
        let chain = FilterChain::from_settings(&settings, SR);

        assert_eq!(chain.low_cut.active_stages(), 2);
        assert_eq!(chain.high_cut.active_stages(), 1);
        for stage in &chain.low_cut.stages[2..] {
            assert!(stage.bypassed);
            assert!(stage.coeffs.is_unity());
        }
        for stage in &chain.high_cut.stages[1..] {
            assert!(stage.bypassed);
            assert!(stage.coeffs.is_unity());
        }
    }

    #[test]
    fn test_slope_change_keeps_indices() {
        let mut chain = FilterChain::from_settings(
            &ChainSettings {
                low_cut_slope: Slope::Db48,
                ..ChainSettings::default()
            },
            SR,
        );
        assert_eq!(chain.low_cut.active_stages(), 4);

        chain.update(&ChainSettings::default(), SR);
        assert_eq!(chain.low_cut.stages.len(), MAX_CUT_STAGES);
        assert_eq!(chain.low_cut.active_stages(), 1);
        assert!(!chain.low_cut.stages[0].coeffs.is_unity());
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let cases = [
            (0.0, 0.0, 0.0),
            (-100.0, -1.0, 24.0),
            (f64::NAN, f64::NAN, f64::NAN),
            (f64::INFINITY, f64::INFINITY, f64::INFINITY),
            (30000.0, 1e-9, -1e9),
        ];
        for (freq, q, gain) in cases {
            let settings = ChainSettings {
                peak_freq: freq,
                peak_quality: q,
                peak_gain_db: gain,
                low_cut_freq: freq,
                high_cut_freq: freq,
                low_cut_slope: Slope::Db48,
                high_cut_slope: Slope::Db48,
                ..ChainSettings::default()
            };
            for sr in [0.0, -1.0, f64::NAN, 1.0, 1.5, 44100.0] {
                let chain = FilterChain::from_settings(&settings, sr);
                assert!(chain.is_finite(), "non-finite chain for {settings:?} @ {sr}");
            }
        }
    }

    #[test]
    fn test_bypassed_chain_is_transparent() {
        let settings = ChainSettings {
            peak_gain_db: 12.0,
            low_cut_freq: 500.0,
            high_cut_freq: 2000.0,
            low_cut_bypassed: true,
            peak_bypassed: true,
            high_cut_bypassed: true,
            ..ChainSettings::default()
        };
        let mut chain = MonoChain::new();
        chain.apply(&FilterChain::from_settings(&settings, SR));

        for i in 0..256 {
            let x = (i as f64 * 0.1).sin();
            assert_eq!(chain.process_sample(x), x);
        }
    }

    #[test]
    fn test_mono_chain_highcut_attenuates() {
        let settings = ChainSettings {
            high_cut_freq: 500.0,
            high_cut_slope: Slope::Db48,
            ..ChainSettings::default()
        };
        let mut chain = MonoChain::new();
        chain.apply(&FilterChain::from_settings(&settings, SR));

        let freq = 8000.0;
        let mut peak: f64 = 0.0;
        for i in 0..48000 {
            let x = (2.0 * PI * freq * i as f64 / SR).sin();
            let y = chain.process_sample(x);
            if i > 24000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 1e-3, "8 kHz leaked through 500 Hz high cut: {peak}");
    }
}
