//! Spectrum path builder
//!
//! Turns one block of FFT decibel magnitudes into a polyline on a log-frequency
//! axis and keeps a short queue of finished paths. Only the newest path
//! matters to a timer-driven display, so the queue drops its oldest entry
//! when full.

use seq_core::{MAX_DISPLAY_FREQ, MIN_DISPLAY_FREQ};
use seq_dsp::LatestQueue;

use crate::common::{DbRange, Path, Rect, frequency_to_x};

pub struct PathBuilder {
    queue: LatestQueue<Path>,
    bin_stride: usize,
}

impl PathBuilder {
    /// `depth` finished paths are kept (at least two); every `bin_stride`-th
    /// bin becomes a vertex.
    pub fn new(depth: usize, bin_stride: usize) -> Self {
        Self {
            queue: LatestQueue::new(depth, Path::new),
            bin_stride: bin_stride.max(1),
        }
    }

    /// Map `fft_data` into `bounds` and queue the result.
    ///
    /// Bins outside the 20 Hz–20 kHz axis are skipped; magnitudes outside
    /// `range` are clamped onto its edges.
    pub fn generate_path(
        &mut self,
        fft_data: &[f64],
        bounds: Rect,
        fft_size: usize,
        sample_rate: f64,
        range: DbRange,
    ) {
        let bin_width = sample_rate / fft_size as f64;
        let stride = self.bin_stride;

        self.queue.push_with(|path| {
            path.clear();
            for (bin, &db) in fft_data.iter().enumerate().step_by(stride) {
                let freq = bin as f64 * bin_width;
                if !(MIN_DISPLAY_FREQ..=MAX_DISPLAY_FREQ).contains(&freq) {
                    continue;
                }
                path.line_to(frequency_to_x(freq, &bounds), range.to_y(db, &bounds));
            }
        });
    }

    #[inline]
    pub fn num_paths_available(&self) -> usize {
        self.queue.len()
    }

    /// Pop the oldest queued path into `out`
    pub fn get_path(&mut self, out: &mut Path) -> bool {
        self.queue.pop(out)
    }

    /// Drain the queue into `out`, keeping only the newest path
    pub fn latest_path(&mut self, out: &mut Path) -> bool {
        self.queue.pop_latest(out)
    }

    /// Paths discarded unread
    #[inline]
    pub fn overwritten(&self) -> u64 {
        self.queue.overwritten()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
