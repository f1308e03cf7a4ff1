//! Per-channel analyzer pipeline driven by the display timer

use seq_core::{AnalyzerConfig, Sample, SeqResult};
use seq_dsp::{AnalysisTaps, FftDataGenerator, FifoConsumer};

use crate::common::{DbRange, Path, Rect};
use crate::spectrum::PathBuilder;

/// FIFO → FFT generator → path builder for one channel.
///
/// Call [`process`](Self::process) once per display frame; it drains every
/// pending audio block, builds a path per FFT block and keeps the newest.
pub struct PathProducer {
    consumer: FifoConsumer<Vec<Sample>>,
    generator: FftDataGenerator,
    builder: PathBuilder,
    range: DbRange,
    sample_rate: f64,
    block: Vec<Sample>,
    fft_data: Vec<f64>,
    path: Path,
    reported_drops: u64,
}

impl PathProducer {
    pub fn new(
        consumer: FifoConsumer<Vec<Sample>>,
        sample_rate: f64,
        block_size: usize,
        config: &AnalyzerConfig,
    ) -> SeqResult<Self> {
        let generator = FftDataGenerator::new(config)?;
        let num_bins = generator.num_bins();
        Ok(Self {
            consumer,
            builder: PathBuilder::new(config.path_queue_depth, config.bin_stride),
            range: DbRange::biased_by_floor(generator.floor_db()),
            generator,
            sample_rate,
            block: vec![0.0; block_size],
            fft_data: vec![config.floor_db; num_bins],
            path: Path::with_capacity(num_bins),
            reported_drops: 0,
        })
    }

    /// Run one frame. Returns true if a new path replaced the previous one.
    pub fn process(&mut self, bounds: Rect) -> bool {
        while self.consumer.pop(&mut self.block) {
            self.generator.push_samples(&self.block);
        }

        while self.generator.get_fft_data(&mut self.fft_data) {
            self.builder.generate_path(
                &self.fft_data,
                bounds,
                self.generator.fft_size(),
                self.sample_rate,
                self.range,
            );
        }

        let dropped = self.consumer.dropped_count();
        if dropped > self.reported_drops {
            log::warn!(
                "Analyzer FIFO overflow: {} blocks dropped ({} total)",
                dropped - self.reported_drops,
                dropped
            );
            self.reported_drops = dropped;
        }

        self.builder.latest_path(&mut self.path)
    }

    /// Most recent path
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent FFT block in dB
    #[inline]
    pub fn fft_data(&self) -> &[f64] {
        &self.fft_data
    }

    /// Frequency and level of the loudest bin in the latest block
    pub fn peak(&self) -> Option<(f64, f64)> {
        let (bin, db) = self
            .fft_data
            .iter()
            .copied()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        Some((self.generator.bin_to_freq(bin, self.sample_rate), db))
    }

    #[inline]
    pub fn dropped_blocks(&self) -> u64 {
        self.consumer.dropped_count()
    }
}

/// Left and right analyzer pipelines
pub struct AnalyzerTaps {
    pub left: PathProducer,
    pub right: PathProducer,
}

impl AnalyzerTaps {
    pub fn new(taps: AnalysisTaps, config: &AnalyzerConfig) -> SeqResult<Self> {
        Ok(Self {
            left: PathProducer::new(taps.left, taps.sample_rate, taps.block_size, config)?,
            right: PathProducer::new(taps.right, taps.sample_rate, taps.block_size, config)?,
        })
    }

    /// Run one frame for both channels; true if either produced a path
    pub fn process(&mut self, bounds: Rect) -> bool {
        let left = self.left.process(bounds);
        let right = self.right.process(bounds);
        left || right
    }
}
