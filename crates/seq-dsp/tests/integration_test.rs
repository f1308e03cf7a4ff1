//! DSP Integration Tests
//!
//! Verifies:
//! - Butterworth cut cascades hit their nominal slope at every rate
//! - Peak filter gain at centre frequency
//! - Processor → FIFO → FFT generator signal path

use seq_core::{AnalyzerConfig, ChainSettings, ParamId, ParameterStore, Slope};
use seq_dsp::filter_chain::{CutChain, make_high_cut_filter, make_low_cut_filter, make_peak_filter};
use seq_dsp::{EqProcessor, FftDataGenerator, FilterChain, SharedChain};
use std::sync::Arc;

const SAMPLE_RATES: [f64; 3] = [44100.0, 48000.0, 96000.0];

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f64, sample_rate: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Check signal has no NaN or Infinity
fn is_valid_signal(signal: &[f64]) -> bool {
    signal.iter().all(|&x| x.is_finite())
}

fn cut_gain_db(cut: &CutChain, freq: f64, sample_rate: f64) -> f64 {
    let mag: f64 = cut
        .stages
        .iter()
        .filter(|s| !s.bypassed)
        .map(|s| s.coeffs.magnitude_for_frequency(freq, sample_rate))
        .product();
    20.0 * mag.log10()
}

/// Analog Butterworth attenuation one octave past the cutoff
fn butterworth_octave_db(order: usize) -> f64 {
    -10.0 * (1.0 + 4.0_f64.powi(order as i32)).log10()
}

#[test]
fn test_low_cut_slope_per_octave() {
    for sr in SAMPLE_RATES {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                low_cut_freq: 1000.0,
                low_cut_slope: slope,
                ..ChainSettings::default()
            };
            let chain = FilterChain::from_settings(&settings, sr);
            let order = 2 * slope.order();

            let at_cutoff = cut_gain_db(&chain.low_cut, 1000.0, sr);
            assert!((at_cutoff + 3.01).abs() < 0.1, "{slope:?} @ {sr}: {at_cutoff} dB at fc");

            let below = cut_gain_db(&chain.low_cut, 500.0, sr);
            let expected = butterworth_octave_db(order);
            assert!(
                (below - expected).abs() < 1.0,
                "{slope:?} @ {sr}: {below} dB, expected {expected} dB"
            );
            assert!((below + slope.db_per_octave()).abs() < 1.5);
        }
    }
}

#[test]
fn test_high_cut_slope_per_octave() {
    for sr in SAMPLE_RATES {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                high_cut_freq: 1000.0,
                high_cut_slope: slope,
                ..ChainSettings::default()
            };
            let chain = FilterChain::from_settings(&settings, sr);

            let at_cutoff = cut_gain_db(&chain.high_cut, 1000.0, sr);
            assert!((at_cutoff + 3.01).abs() < 0.1, "{slope:?} @ {sr}: {at_cutoff} dB at fc");

            let above = cut_gain_db(&chain.high_cut, 2000.0, sr);
            assert!(
                (above + slope.db_per_octave()).abs() < 1.5,
                "{slope:?} @ {sr}: {above} dB one octave up"
            );
        }
    }
}

#[test]
fn test_cut_passband_is_flat() {
    let settings = ChainSettings {
        low_cut_freq: 100.0,
        high_cut_freq: 10000.0,
        low_cut_slope: Slope::Db48,
        high_cut_slope: Slope::Db48,
        ..ChainSettings::default()
    };
    for sr in SAMPLE_RATES {
        let low = make_low_cut_filter(&settings, sr);
        let high = make_high_cut_filter(&settings, sr);
        let mag: f64 = low
            .iter()
            .chain(high.iter())
            .map(|c| c.magnitude_for_frequency(1000.0, sr))
            .product();
        assert!((20.0 * mag.log10()).abs() < 0.05);
    }
}

#[test]
fn test_peak_gain_at_centre() {
    for sr in SAMPLE_RATES {
        for gain in [-24.0, -6.0, 0.0, 12.0, 24.0] {
            let settings = ChainSettings {
                peak_freq: 750.0,
                peak_gain_db: gain,
                peak_quality: 2.0,
                ..ChainSettings::default()
            };
            let coeffs = make_peak_filter(&settings, sr);
            let db = 20.0 * coeffs.magnitude_for_frequency(750.0, sr).log10();
            assert!((db - gain).abs() < 0.01, "{gain} dB peak read {db} dB @ {sr}");
        }
    }
}

#[test]
fn test_sine_through_processor_into_analyzer() {
    let sample_rate = 48000.0;
    let block_size = 512;

    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::LowCutBypassed, 1.0);
    params.set(ParamId::PeakBypassed, 1.0);
    params.set(ParamId::HighCutBypassed, 1.0);
    let shared = Arc::new(SharedChain::default());
    let mut eq = EqProcessor::new(params, shared);

    let config = AnalyzerConfig::default();
    let mut taps = eq.prepare(sample_rate, block_size, &config).unwrap();
    let mut fft = FftDataGenerator::new(&config).unwrap();
    assert_eq!(fft.fft_size(), 4096);

    let mut signal = generate_sine(block_size * 16, 1000.0, sample_rate);
    let mut block = vec![0.0; block_size];
    for chunk in signal.chunks_mut(block_size) {
        eq.process_mono(chunk);
        while taps.left.pop(&mut block) {
            fft.push_samples(&block);
        }
    }
    assert!(is_valid_signal(&signal));
    assert_eq!(taps.left.dropped_count(), 0);

    let mut spectrum = Vec::new();
    assert!(fft.get_latest_fft_data(&mut spectrum));
    let (peak, peak_db) = spectrum
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();

    assert_eq!(peak, 85);
    assert!(peak_db.abs() < 1.0, "1 kHz full-scale sine read {peak_db} dB");
    assert!(spectrum[10] <= -40.0);
}

#[test]
fn test_processor_output_stays_finite_under_extremes() {
    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::PeakGain, 24.0);
    params.set(ParamId::PeakQuality, 10.0);
    params.set(ParamId::PeakFreq, 20000.0);
    params.set(ParamId::LowCutFreq, 20000.0);
    params.set(ParamId::LowCutSlope, 3.0);
    let mut eq = EqProcessor::new(params, Arc::new(SharedChain::default()));
    let _taps = eq.prepare(44100.0, 256, &AnalyzerConfig::default()).unwrap();

    let mut signal = generate_sine(44100, 19000.0, 44100.0);
    for chunk in signal.chunks_mut(256) {
        eq.process_mono(chunk);
    }
    assert!(is_valid_signal(&signal));
}
