//! Display pipeline tests
//!
//! Verifies:
//! - Cascade bypass in the response curve equals a unity-substituted chain
//! - Spectrum and response paths never leave their bounds
//! - Processor → analyzer taps → paths with the response following parameters

use seq_core::{AnalyzerConfig, ChainSettings, ParamId, ParameterStore, Slope};
use seq_dsp::filter_chain::{CutChain, FilterStage};
use seq_dsp::{EqProcessor, FilterChain, SharedChain};
use seq_viz::{
    AnalyzerTaps, DbRange, PathBuilder, Rect, ResponseCurve, analysis_area, compute_response_curve,
    magnitudes_db,
};
use std::sync::Arc;

const SAMPLE_RATE: f64 = 48000.0;
const EDITOR: Rect = Rect::new(0.0, 0.0, 600.0, 240.0);

fn busy_settings() -> ChainSettings {
    ChainSettings {
        peak_freq: 2500.0,
        peak_gain_db: 10.0,
        peak_quality: 3.0,
        low_cut_freq: 300.0,
        high_cut_freq: 6000.0,
        low_cut_slope: Slope::Db36,
        high_cut_slope: Slope::Db24,
        ..ChainSettings::default()
    }
}

fn unity_cut() -> CutChain {
    CutChain {
        stages: [FilterStage::UNITY; 4],
        bypassed: false,
    }
}

#[test]
fn test_cascade_bypass_equals_unity_substitution() {
    let cases = [
        (true, false, false),
        (false, true, false),
        (false, false, true),
        (true, true, true),
    ];
    for (low, peak, high) in cases {
        let bypassed = FilterChain::from_settings(
            &ChainSettings {
                low_cut_bypassed: low,
                peak_bypassed: peak,
                high_cut_bypassed: high,
                ..busy_settings()
            },
            SAMPLE_RATE,
        );

        let mut substituted = FilterChain::from_settings(&busy_settings(), SAMPLE_RATE);
        if low {
            substituted.low_cut = unity_cut();
        }
        if peak {
            substituted.peak = FilterStage::UNITY;
        }
        if high {
            substituted.high_cut = unity_cut();
        }

        let a = magnitudes_db(&bypassed, SAMPLE_RATE, 400);
        let b = magnitudes_db(&substituted, SAMPLE_RATE, 400);
        for (i, (x, y)) in a.iter().zip(&b).enumerate() {
            assert!((x - y).abs() < 1e-9, "column {i}: {x} vs {y} for {low}/{peak}/{high}");
        }
    }
}

#[test]
fn test_all_bypassed_is_exactly_flat() {
    let chain = FilterChain::from_settings(
        &ChainSettings {
            low_cut_bypassed: true,
            peak_bypassed: true,
            high_cut_bypassed: true,
            ..busy_settings()
        },
        SAMPLE_RATE,
    );
    assert!(magnitudes_db(&chain, SAMPLE_RATE, 256).iter().all(|&db| db == 0.0));
}

#[test]
fn test_response_curve_clamped_to_display() {
    let area = analysis_area(EDITOR);
    let settings = ChainSettings {
        peak_gain_db: 24.0,
        peak_quality: 0.1,
        low_cut_freq: 2000.0,
        low_cut_slope: Slope::Db48,
        ..ChainSettings::default()
    };
    let chain = FilterChain::from_settings(&settings, SAMPLE_RATE);
    let path = compute_response_curve(&chain, SAMPLE_RATE, area);
    assert_eq!(path.len(), area.width as usize);
    assert!(path.points().iter().all(|p| area.contains(*p)));
    assert!(path.points().iter().any(|p| p.y == area.bottom()));
}

#[test]
fn test_spectrum_path_clamped_to_display() {
    let area = analysis_area(EDITOR);
    let mut builder = PathBuilder::new(2, 1);
    let data: Vec<f64> = (0..2048).map(|i| i as f64 - 1000.0).collect();
    builder.generate_path(&data, area, 4096, SAMPLE_RATE, DbRange::DISPLAY);

    let mut path = seq_viz::Path::new();
    assert!(builder.get_path(&mut path));
    for p in path.points() {
        assert!(area.contains(*p));
    }
    assert_eq!(path.points().first().map(|p| p.y), Some(area.bottom()));
    assert_eq!(path.points().last().map(|p| p.y), Some(area.top()));
}

#[test]
fn test_host_to_display_round_trip() {
    let params = Arc::new(ParameterStore::new());
    let shared = Arc::new(SharedChain::default());
    let mut eq = EqProcessor::new(Arc::clone(&params), Arc::clone(&shared));
    let config = AnalyzerConfig::default();
    let block_size = 480;

    let mut taps = AnalyzerTaps::new(eq.prepare(SAMPLE_RATE, block_size, &config).unwrap(), &config)
        .unwrap();
    let mut response = ResponseCurve::new(Arc::clone(&shared), SAMPLE_RATE);
    let area = analysis_area(EDITOR);

    params.set(ParamId::PeakFreq, 1000.0);
    params.set(ParamId::PeakGain, 12.0);

    let mut phase = 0.0_f64;
    let step = 2.0 * std::f64::consts::PI * 1000.0 / SAMPLE_RATE;
    let mut left = vec![0.0; block_size];
    let mut right = vec![0.0; block_size];
    let mut frames_with_path = 0;

    // 0.5 s of audio, a display frame every 800 samples (60 Hz)
    for block in 0..50 {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = 0.1 * phase.sin();
            *r = 0.0;
            phase += step;
        }
        eq.process_stereo(&mut left, &mut right);

        if block % 2 == 1 && taps.process(area) {
            frames_with_path += 1;
        }
    }

    assert!(frames_with_path > 0);
    assert!(!taps.left.path().is_empty());

    // 0.1 amplitude (−20 dB) boosted 12 dB by the peak
    let (freq, db) = taps.left.peak().unwrap();
    assert!((freq - 1000.0).abs() <= SAMPLE_RATE / 4096.0);
    assert!((db + 8.0).abs() < 1.5, "peak read {db} dB");

    // Silent right channel sits on the analyzer floor
    assert!(taps.right.fft_data().iter().all(|&db| db == config.floor_db));

    assert!(response.tick(area));
    assert!((response.gain_db_at(1000.0) - 12.0).abs() < 0.05);
    assert!(!response.tick(area));
}
