//! Spectrum analysis: rolling accumulator and windowed FFT magnitudes
//!
//! Runs on the visualization thread. Everything is sized in the constructor;
//! producing a block only touches preallocated buffers.

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use seq_core::{AnalyzerConfig, Decibels, Sample, SeqResult, WindowFunction};
use std::sync::Arc;

use crate::fifo::LatestQueue;
use crate::window::WindowTable;

/// Rolling window holding the most recent `len` samples.
///
/// A circular buffer with a logical write cursor: the oldest sample is the
/// one under the cursor, so appending never shifts memory.
#[derive(Debug, Clone)]
pub struct MonoAccumulator {
    buffer: Vec<Sample>,
    write_pos: usize,
    samples_written: u64,
}

impl MonoAccumulator {
    /// Zero-filled, so a partial stream still yields full-length windows
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            write_pos: 0,
            samples_written: 0,
        }
    }

    /// Append samples, discarding the oldest
    pub fn push(&mut self, samples: &[Sample]) {
        let len = self.buffer.len();
        self.samples_written += samples.len() as u64;

        if samples.len() >= len {
            self.buffer.copy_from_slice(&samples[samples.len() - len..]);
            self.write_pos = 0;
            return;
        }

        let first = (len - self.write_pos).min(samples.len());
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&samples[..first]);
        let rest = samples.len() - first;
        self.buffer[..rest].copy_from_slice(&samples[first..]);
        self.write_pos = (self.write_pos + samples.len()) % len;
    }

    /// Copy the window into `out`, oldest sample first
    pub fn copy_ordered(&self, out: &mut [Sample]) {
        let split = self.buffer.len() - self.write_pos;
        out[..split].copy_from_slice(&self.buffer[self.write_pos..]);
        out[split..].copy_from_slice(&self.buffer[..self.write_pos]);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.samples_written = 0;
    }
}

/// Windowed FFT magnitude generator producing decibel blocks per hop
pub struct FftDataGenerator {
    fft: Arc<dyn RealToComplex<f64>>,
    fft_size: usize,
    hop_size: usize,
    floor_db: f64,
    window: WindowTable,
    accumulator: MonoAccumulator,
    since_last_block: usize,
    /// Windowed copy of the accumulator (transform input)
    scratch_windowed: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    fft_scratch: Vec<Complex<f64>>,
    queue: LatestQueue<Vec<f64>>,
    blocks_produced: u64,
}

impl FftDataGenerator {
    pub fn new(config: &AnalyzerConfig) -> SeqResult<Self> {
        config.validate()?;

        let fft_size = config.fft_size();
        let num_bins = config.num_bins();
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let spectrum = fft.make_output_vec();
        let fft_scratch = fft.make_scratch_vec();

        log::debug!(
            "FFT generator: size {} hop {} window {:?} floor {} dB",
            fft_size,
            config.hop_size(),
            config.window,
            config.floor_db
        );

        Ok(Self {
            fft,
            fft_size,
            hop_size: config.hop_size(),
            floor_db: config.floor_db,
            window: WindowTable::new(config.window, fft_size, true),
            accumulator: MonoAccumulator::new(fft_size),
            since_last_block: 0,
            scratch_windowed: vec![0.0; fft_size],
            spectrum,
            fft_scratch,
            queue: LatestQueue::new(config.path_queue_depth, || vec![config.floor_db; num_bins]),
            blocks_produced: 0,
        })
    }

    /// Feed samples; a block is produced every time `hop_size` new samples
    /// have arrived since the previous one.
    pub fn push_samples(&mut self, mut samples: &[Sample]) {
        while !samples.is_empty() {
            let n = (self.hop_size - self.since_last_block).min(samples.len());
            self.accumulator.push(&samples[..n]);
            self.since_last_block += n;
            samples = &samples[n..];

            if self.since_last_block >= self.hop_size {
                self.produce_fft_data();
            }
        }
    }

    /// Transform the current window and queue one dB block
    pub fn produce_fft_data(&mut self) {
        self.since_last_block = 0;
        self.accumulator.copy_ordered(&mut self.scratch_windowed);
        self.window.apply(&mut self.scratch_windowed);

        let result = self.fft.process_with_scratch(
            &mut self.scratch_windowed,
            &mut self.spectrum,
            &mut self.fft_scratch,
        );

        let floor = self.floor_db;
        let num_bins = self.fft_size / 2;
        let scale = 1.0 / num_bins as f64;
        let spectrum = &self.spectrum;

        match result {
            Ok(()) => self.queue.push_with(|block| {
                for (db, c) in block.iter_mut().zip(&spectrum[..num_bins]) {
                    *db = Decibels::from_gain_floored(c.norm() * scale, floor).0;
                }
            }),
            Err(e) => {
                log::warn!("FFT failed, emitting silence: {e}");
                self.queue.push_with(|block| block.fill(floor));
            }
        }
        self.blocks_produced += 1;
    }

    #[inline]
    pub fn num_available_fft_blocks(&self) -> usize {
        self.queue.len()
    }

    /// Pop the oldest complete block into `out`
    pub fn get_fft_data(&mut self, out: &mut Vec<f64>) -> bool {
        self.queue.pop(out)
    }

    /// Drain the queue, keeping only the newest block
    pub fn get_latest_fft_data(&mut self, out: &mut Vec<f64>) -> bool {
        self.queue.pop_latest(out)
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    #[inline]
    pub fn floor_db(&self) -> f64 {
        self.floor_db
    }

    #[inline]
    pub fn window(&self) -> WindowFunction {
        self.window.kind()
    }

    /// Blocks dropped because the consumer fell behind
    #[inline]
    pub fn overwritten_blocks(&self) -> u64 {
        self.queue.overwritten()
    }

    #[inline]
    pub fn blocks_produced(&self) -> u64 {
        self.blocks_produced
    }

    /// Get frequency for a bin index
    #[inline]
    pub fn bin_to_freq(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }

    /// Get bin index for a frequency
    #[inline]
    pub fn freq_to_bin(&self, freq: f64, sample_rate: f64) -> usize {
        ((freq * self.fft_size as f64) / sample_rate).round() as usize
    }

    /// Swap the window function (allocates; not for the audio thread)
    pub fn set_window(&mut self, kind: WindowFunction) {
        self.window = WindowTable::new(kind, self.fft_size, true);
    }

    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.queue.clear();
        self.since_last_block = 0;
    }
}
