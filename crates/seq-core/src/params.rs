//! Parameter identifiers, ranges and lock-free storage cells

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Every control the EQ exposes to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
    LowCutBypassed,
    PeakBypassed,
    HighCutBypassed,
}

impl ParamId {
    pub const COUNT: usize = 10;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::LowCutFreq,
        ParamId::HighCutFreq,
        ParamId::PeakFreq,
        ParamId::PeakGain,
        ParamId::PeakQuality,
        ParamId::LowCutSlope,
        ParamId::HighCutSlope,
        ParamId::LowCutBypassed,
        ParamId::PeakBypassed,
        ParamId::HighCutBypassed,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Host-facing display name
    pub fn name(self) -> &'static str {
        match self {
            ParamId::LowCutFreq => "LowCut Freq",
            ParamId::HighCutFreq => "HighCut Freq",
            ParamId::PeakFreq => "Peak Freq",
            ParamId::PeakGain => "Peak Gain",
            ParamId::PeakQuality => "Peak Quality",
            ParamId::LowCutSlope => "LowCut Slope",
            ParamId::HighCutSlope => "HighCut Slope",
            ParamId::LowCutBypassed => "LowCut Bypassed",
            ParamId::PeakBypassed => "Peak Bypassed",
            ParamId::HighCutBypassed => "HighCut Bypassed",
        }
    }

    /// Unit suffix used when formatting the value for a knob
    pub fn suffix(self) -> &'static str {
        match self {
            ParamId::LowCutFreq | ParamId::HighCutFreq | ParamId::PeakFreq => "Hz",
            ParamId::PeakGain => "dB",
            ParamId::LowCutSlope | ParamId::HighCutSlope => "dB/Oct",
            _ => "",
        }
    }

    /// Range, skew and default of this control
    pub fn range(self) -> ParamRange {
        match self {
            ParamId::LowCutFreq => ParamRange::skewed(20.0, 20000.0, 20.0, FREQ_SKEW),
            ParamId::HighCutFreq => ParamRange::skewed(20.0, 20000.0, 20000.0, FREQ_SKEW),
            ParamId::PeakFreq => ParamRange::skewed(20.0, 20000.0, 750.0, FREQ_SKEW),
            ParamId::PeakGain => ParamRange::linear(-24.0, 24.0, 0.0),
            ParamId::PeakQuality => ParamRange::linear(0.1, 10.0, 1.0),
            ParamId::LowCutSlope | ParamId::HighCutSlope => ParamRange::linear(0.0, 3.0, 0.0),
            ParamId::LowCutBypassed | ParamId::PeakBypassed | ParamId::HighCutBypassed => {
                ParamRange::linear(0.0, 1.0, 0.0)
            }
        }
    }

    /// Choice and toggle parameters snap to whole numbers
    #[inline]
    pub fn is_discrete(self) -> bool {
        !matches!(
            self,
            ParamId::LowCutFreq
                | ParamId::HighCutFreq
                | ParamId::PeakFreq
                | ParamId::PeakGain
                | ParamId::PeakQuality
        )
    }
}

/// Frequency knobs spend most of their travel in the low range.
const FREQ_SKEW: f64 = 4.0;

/// Parameter range specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub skew: ParamSkew,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Linear,
        }
    }

    pub fn skewed(min: f64, max: f64, default: f64, exponent: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Exponential(exponent),
        }
    }

    /// Clamp a plain value into the range; NaN falls back to the default
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Denormalize a 0-1 value to actual value
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
        match self.skew {
            ParamSkew::Linear => self.min + normalized * (self.max - self.min),
            ParamSkew::Exponential(exp) => self.min + normalized.powf(exp) * (self.max - self.min),
        }
    }

    /// Normalize an actual value to 0-1
    pub fn normalize(&self, value: f64) -> f64 {
        let clamped = self.clamp(value);
        match self.skew {
            ParamSkew::Linear => (clamped - self.min) / (self.max - self.min),
            ParamSkew::Exponential(exp) => {
                ((clamped - self.min) / (self.max - self.min)).powf(1.0 / exp)
            }
        }
    }
}

/// Parameter skew type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamSkew {
    Linear,
    Exponential(f64),
}

/// Atomic parameter for lock-free access
pub struct AtomicParam {
    bits: AtomicU64,
}

impl AtomicParam {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl std::fmt::Debug for AtomicParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicParam").field(&self.get()).finish()
    }
}
