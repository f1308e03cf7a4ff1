//! Control-value snapshot and the lock-free store it is read from

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{AtomicParam, ParamId};

/// Cut filter slope, in 12 dB/octave steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Number of active second-order sections (1..=4)
    #[inline]
    pub fn order(self) -> usize {
        self as usize + 1
    }

    #[inline]
    pub fn db_per_octave(self) -> f64 {
        12.0 * self.order() as f64
    }

    /// Slope from a choice index; out-of-range values saturate
    pub fn from_index(index: f64) -> Self {
        if !index.is_finite() || index < 0.5 {
            return Slope::Db12;
        }
        match index.round() as usize {
            0 => Slope::Db12,
            1 => Slope::Db24,
            2 => Slope::Db36,
            _ => Slope::Db48,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Slope::Db12 => "12 dB/Oct",
            Slope::Db24 => "24 dB/Oct",
            Slope::Db36 => "36 dB/Oct",
            Slope::Db48 => "48 dB/Oct",
        }
    }
}

/// Snapshot of every user-facing control value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    pub peak_freq: f64,
    pub peak_gain_db: f64,
    pub peak_quality: f64,
    pub low_cut_freq: f64,
    pub high_cut_freq: f64,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub low_cut_bypassed: bool,
    pub peak_bypassed: bool,
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: ParamId::PeakFreq.range().default,
            peak_gain_db: ParamId::PeakGain.range().default,
            peak_quality: ParamId::PeakQuality.range().default,
            low_cut_freq: ParamId::LowCutFreq.range().default,
            high_cut_freq: ParamId::HighCutFreq.range().default,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
            low_cut_bypassed: false,
            peak_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}

impl ChainSettings {
    /// Plain value of one control in this snapshot
    pub fn value(&self, id: ParamId) -> f64 {
        match id {
            ParamId::LowCutFreq => self.low_cut_freq,
            ParamId::HighCutFreq => self.high_cut_freq,
            ParamId::PeakFreq => self.peak_freq,
            ParamId::PeakGain => self.peak_gain_db,
            ParamId::PeakQuality => self.peak_quality,
            ParamId::LowCutSlope => self.low_cut_slope.index() as f64,
            ParamId::HighCutSlope => self.high_cut_slope.index() as f64,
            ParamId::LowCutBypassed => bool_value(self.low_cut_bypassed),
            ParamId::PeakBypassed => bool_value(self.peak_bypassed),
            ParamId::HighCutBypassed => bool_value(self.high_cut_bypassed),
        }
    }
}

#[inline]
fn bool_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// Lock-free parameter storage shared by the host, audio and GUI threads.
///
/// Each value is an independent atomic; `version` is bumped after every
/// write so readers can detect that a fresh `chain_settings()` is needed.
/// A snapshot taken while a write is in flight may mix old and new values,
/// but the version bump that follows guarantees it is read again.
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicParam; ParamId::COUNT],
    version: AtomicU64,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::from_settings(&ChainSettings::default())
    }

    pub fn from_settings(settings: &ChainSettings) -> Self {
        let store = Self {
            values: std::array::from_fn(|i| AtomicParam::new(ParamId::ALL[i].range().default)),
            version: AtomicU64::new(0),
        };
        store.load(settings);
        store
    }

    /// Set a plain value (clamped to the parameter range)
    pub fn set(&self, id: ParamId, value: f64) {
        let range = id.range();
        let mut value = range.clamp(value);
        if id.is_discrete() {
            value = value.round();
        }
        self.values[id.index()].set(value);
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Set from a normalized 0-1 knob position
    pub fn set_normalized(&self, id: ParamId, normalized: f64) {
        self.set(id, id.range().denormalize(normalized));
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f64 {
        self.values[id.index()].get()
    }

    pub fn get_normalized(&self, id: ParamId) -> f64 {
        id.range().normalize(self.get(id))
    }

    /// Overwrite every control from a snapshot
    pub fn load(&self, settings: &ChainSettings) {
        for id in ParamId::ALL {
            self.set(id, settings.value(id));
        }
    }

    /// Monotonic change counter
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Read the current controls without blocking
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            peak_freq: self.get(ParamId::PeakFreq),
            peak_gain_db: self.get(ParamId::PeakGain),
            peak_quality: self.get(ParamId::PeakQuality),
            low_cut_freq: self.get(ParamId::LowCutFreq),
            high_cut_freq: self.get(ParamId::HighCutFreq),
            low_cut_slope: Slope::from_index(self.get(ParamId::LowCutSlope)),
            high_cut_slope: Slope::from_index(self.get(ParamId::HighCutSlope)),
            low_cut_bypassed: self.get(ParamId::LowCutBypassed) > 0.5,
            peak_bypassed: self.get(ParamId::PeakBypassed) > 0.5,
            high_cut_bypassed: self.get(ParamId::HighCutBypassed) > 0.5,
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
