//! seq-core: Shared types for the SimpleEQ analysis core
//!
//! Sample and decibel types, control-value settings, lock-free parameter
//! storage, analyzer configuration and the common error type.

mod config;
mod error;
mod params;
mod settings;

pub use config::*;
pub use error::*;
pub use params::*;
pub use settings::*;

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Lowest frequency shown on every analyzer/response display
pub const MIN_DISPLAY_FREQ: f64 = 20.0;

/// Highest frequency shown on every analyzer/response display
pub const MAX_DISPLAY_FREQ: f64 = 20_000.0;

/// Standard sample rate options
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum SampleRate {
    Hz44100 = 44100,
    Hz48000 = 48000,
    Hz88200 = 88200,
    Hz96000 = 96000,
    Hz176400 = 176400,
    Hz192000 = 192000,
}

impl SampleRate {
    #[inline]
    pub fn as_f64(self) -> f64 {
        self as u32 as f64
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Match an arbitrary host rate against the standard set
    pub fn from_hz(hz: u32) -> SeqResult<Self> {
        match hz {
            44100 => Ok(Self::Hz44100),
            48000 => Ok(Self::Hz48000),
            88200 => Ok(Self::Hz88200),
            96000 => Ok(Self::Hz96000),
            176400 => Ok(Self::Hz176400),
            192000 => Ok(Self::Hz192000),
            other => Err(SeqError::InvalidSampleRate(other)),
        }
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Hz48000
    }
}

/// Buffer size options
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum BufferSize {
    Samples32 = 32,
    Samples64 = 64,
    Samples128 = 128,
    Samples256 = 256,
    Samples512 = 512,
    Samples1024 = 1024,
    Samples2048 = 2048,
    Samples4096 = 4096,
}

impl BufferSize {
    #[inline]
    pub fn as_usize(self) -> usize {
        self as u32 as usize
    }

    /// Match a host block size against the standard set
    pub fn from_samples(samples: usize) -> SeqResult<Self> {
        match samples {
            32 => Ok(Self::Samples32),
            64 => Ok(Self::Samples64),
            128 => Ok(Self::Samples128),
            256 => Ok(Self::Samples256),
            512 => Ok(Self::Samples512),
            1024 => Ok(Self::Samples1024),
            2048 => Ok(Self::Samples2048),
            4096 => Ok(Self::Samples4096),
            other => Err(SeqError::InvalidBlockSize(other)),
        }
    }

    /// Calculate latency in milliseconds
    #[inline]
    pub fn latency_ms(self, sample_rate: SampleRate) -> f64 {
        (self.as_usize() as f64 / sample_rate.as_f64()) * 1000.0
    }
}

impl Default for BufferSize {
    fn default() -> Self {
        Self::Samples512
    }
}

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    /// Gain to decibels with a floor: anything at or below zero gain, or
    /// quieter than `floor_db`, reports `floor_db`.
    #[inline]
    pub fn from_gain_floored(gain: f64, floor_db: f64) -> Self {
        if gain > 0.0 {
            Self((20.0 * gain.log10()).max(floor_db))
        } else {
            Self(floor_db)
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}
