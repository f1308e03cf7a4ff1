//! Simulated plugin host: an audio thread and a display-timer thread
//!
//! The audio thread owns the `EqProcessor` and feeds it fixed-size blocks,
//! optionally paced at real time. The display thread owns the analyzer taps
//! and the response curve and wakes at `refresh_hz`. They share nothing but
//! the FIFOs, the parameter store and the coefficient snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use seq_core::{AnalyzerConfig, ParamId, ParameterStore};
use seq_dsp::{EqProcessor, SharedChain};
use seq_viz::grid::GRID_FREQUENCIES;
use seq_viz::{AnalyzerTaps, Rect, ResponseCurve, analysis_area, map_to_log10};

use crate::input::StereoSignal;

/// Editor size the display thread lays out against
const EDITOR_BOUNDS: Rect = Rect::new(0.0, 0.0, 600.0, 240.0);

pub struct HostOptions {
    pub block_size: usize,
    pub realtime: bool,
    /// Sweep the peak frequency across the spectrum while playing
    pub sweep: bool,
    pub analyzer: AnalyzerConfig,
}

/// What the display thread saw
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub frames: u64,
    pub paths: u64,
    pub response_updates: u64,
    pub left_peak: Option<(f64, f64)>,
    pub right_peak: Option<(f64, f64)>,
    pub dropped_blocks: u64,
    /// Response in dB at each grid frequency, last frame
    pub response_db: Vec<(f64, f64)>,
}

/// Play `signal` through the EQ and return the processed audio
pub fn run(
    signal: StereoSignal,
    params: Arc<ParameterStore>,
    opts: &HostOptions,
) -> Result<(StereoSignal, Report)> {
    let sample_rate = signal.sample_rate as f64;
    let shared = Arc::new(SharedChain::default());
    let mut eq = EqProcessor::new(Arc::clone(&params), Arc::clone(&shared));
    let taps = eq.prepare(sample_rate, opts.block_size, &opts.analyzer)?;
    let mut taps = AnalyzerTaps::new(taps, &opts.analyzer)?;
    let mut response = ResponseCurve::new(Arc::clone(&shared), sample_rate);

    let done = Arc::new(AtomicBool::new(false));
    let report = Arc::new(Mutex::new(Report::default()));
    let block_size = opts.block_size;
    let realtime = opts.realtime;

    let audio = {
        let done = Arc::clone(&done);
        thread::Builder::new()
            .name("audio".into())
            .spawn(move || {
                let mut signal = signal;
                let block_time = Duration::from_secs_f64(block_size as f64 / sample_rate);
                let start = Instant::now();
                let (left, right) = (&mut signal.left, &mut signal.right);
                for (i, (l, r)) in left
                    .chunks_mut(block_size)
                    .zip(right.chunks_mut(block_size))
                    .enumerate()
                {
                    eq.process_stereo(l, r);
                    if realtime {
                        let due = block_time * (i as u32 + 1);
                        if let Some(wait) = due.checked_sub(start.elapsed()) {
                            thread::sleep(wait);
                        }
                    }
                }
                done.store(true, Ordering::Release);
                signal
            })?
    };

    let display = {
        let done = Arc::clone(&done);
        let report = Arc::clone(&report);
        let frame_time = Duration::from_secs_f64(1.0 / opts.analyzer.refresh_hz as f64);
        thread::Builder::new()
            .name("display".into())
            .spawn(move || {
                let area = analysis_area(EDITOR_BOUNDS);
                loop {
                    // Read before draining so the last audio block is always seen
                    let finished = done.load(Ordering::Acquire);
                    let new_path = taps.process(area);
                    let new_curve = response.tick(area);

                    let mut r = report.lock();
                    r.frames += 1;
                    r.paths += new_path as u64;
                    r.response_updates += new_curve as u64;
                    r.left_peak = taps.left.peak();
                    r.right_peak = taps.right.peak();
                    r.dropped_blocks = taps.left.dropped_blocks() + taps.right.dropped_blocks();
                    if new_curve {
                        r.response_db = GRID_FREQUENCIES
                            .iter()
                            .map(|&f| (f, response.gain_db_at(f)))
                            .collect();
                    }
                    drop(r);

                    if finished {
                        break;
                    }
                    thread::sleep(frame_time);
                }
            })?
    };

    if opts.sweep {
        let start = Instant::now();
        while !done.load(Ordering::Acquire) {
            let t = start.elapsed().as_secs_f64();
            let position = 0.5 - 0.5 * (t * std::f64::consts::PI * 0.5).cos();
            params.set(ParamId::PeakFreq, map_to_log10(position, 100.0, 10000.0));
            thread::sleep(Duration::from_millis(20));
        }
    }

    let processed = audio.join().map_err(|_| anyhow!("audio thread panicked"))?;
    display.join().map_err(|_| anyhow!("display thread panicked"))?;

    let report = report.lock().clone();
    Ok((processed, report))
}
