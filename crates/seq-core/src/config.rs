//! Analyzer configuration (JSON-loadable)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{SeqError, SeqResult};

/// Smallest supported FFT order (2048 points)
pub const MIN_FFT_ORDER: u32 = 11;
/// Largest supported FFT order (32768 points)
pub const MAX_FFT_ORDER: u32 = 15;

/// Window applied before the forward transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    #[default]
    BlackmanHarris,
}

/// Spectrum analyzer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// FFT size is `1 << fft_order`
    pub fft_order: u32,
    /// Hop size is `fft_size / hop_divisor` (2 = 50 %, 4 = 75 % overlap)
    pub hop_divisor: usize,
    /// Number of audio blocks the cross-thread FIFO can hold
    pub fifo_capacity: usize,
    /// Magnitude floor in dB; silence reports exactly this value
    pub floor_db: f64,
    /// Queue depth for FFT blocks and finished paths
    pub path_queue_depth: usize,
    /// Visualization timer rate
    pub refresh_hz: u32,
    pub window: WindowFunction,
    /// Emit every n-th bin into the spectrum path
    pub bin_stride: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_order: 12,
            hop_divisor: 4,
            fifo_capacity: 32,
            floor_db: -48.0,
            path_queue_depth: 4,
            refresh_hz: 60,
            window: WindowFunction::BlackmanHarris,
            bin_stride: 1,
        }
    }
}

impl AnalyzerConfig {
    #[inline]
    pub fn fft_size(&self) -> usize {
        1usize << self.fft_order
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.fft_size() / self.hop_divisor.max(1)
    }

    /// Number of dB magnitudes in one FFT data block
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size() / 2
    }

    pub fn validate(&self) -> SeqResult<()> {
        if !(MIN_FFT_ORDER..=MAX_FFT_ORDER).contains(&self.fft_order) {
            return Err(SeqError::InvalidFftOrder(self.fft_order));
        }
        if !matches!(self.hop_divisor, 2 | 4) {
            return Err(SeqError::Config(format!(
                "hop_divisor must be 2 or 4 (got {})",
                self.hop_divisor
            )));
        }
        if self.fifo_capacity < 2 {
            return Err(SeqError::Config(format!(
                "fifo_capacity must be at least 2 (got {})",
                self.fifo_capacity
            )));
        }
        if !self.floor_db.is_finite() || self.floor_db >= 0.0 {
            return Err(SeqError::Config(format!(
                "floor_db must be a finite negative value (got {})",
                self.floor_db
            )));
        }
        if self.path_queue_depth < 2 {
            return Err(SeqError::Config(format!(
                "path_queue_depth must be at least 2 (got {})",
                self.path_queue_depth
            )));
        }
        if self.refresh_hz == 0 || self.refresh_hz > 240 {
            return Err(SeqError::Config(format!(
                "refresh_hz must be in 1..=240 (got {})",
                self.refresh_hz
            )));
        }
        if self.bin_stride == 0 {
            return Err(SeqError::Config("bin_stride must be non-zero".into()));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> SeqResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SeqResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded analyzer config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> SeqResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
