//! Coefficient snapshot shared between the audio and GUI threads
//!
//! `SharedChain` is a sequence lock over atomic words: the writer moves the
//! sequence to an odd value, stores every coefficient, then moves it to the
//! next even value. A reader accepts a copy only when it saw the same even
//! sequence before and after copying, so a half-written set is never returned.
//! No mutex, no allocation, and a reader never holds up the writer.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering, fence};

use crate::biquad::BiquadCoeffs;
use crate::filter_chain::{CutChain, FilterChain, FilterStage, MAX_CUT_STAGES};

const WORDS_PER_STAGE: usize = 6;
const STAGE_COUNT: usize = 2 * MAX_CUT_STAGES + 1;
const CHAIN_WORDS: usize = STAGE_COUNT * WORDS_PER_STAGE + 2;

/// Read attempts before `try_snapshot` gives up on a busy writer
const READ_ATTEMPTS: usize = 64;

/// Single atomic "settings changed" flag with dirty → consumed semantics
#[derive(Debug, Default)]
pub struct ChangeFlag {
    dirty: AtomicBool,
}

impl ChangeFlag {
    pub fn new(dirty: bool) -> Self {
        Self {
            dirty: AtomicBool::new(dirty),
        }
    }

    #[inline]
    pub fn mark(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Consume the flag; true exactly once per `mark`
    #[inline]
    pub fn take(&self) -> bool {
        self.dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

/// Lock-free published `FilterChain`
pub struct SharedChain {
    seq: CachePadded<AtomicU64>,
    words: [AtomicU64; CHAIN_WORDS],
    changed: ChangeFlag,
}

impl SharedChain {
    pub fn new(initial: &FilterChain) -> Self {
        let encoded = encode(initial);
        Self {
            seq: CachePadded::new(AtomicU64::new(0)),
            words: std::array::from_fn(|i| AtomicU64::new(encoded[i])),
            changed: ChangeFlag::new(true),
        }
    }

    /// Publish a new chain.
    ///
    /// Returns false without writing if another publish is in progress;
    /// callers on the audio thread retry on their next block.
    pub fn publish(&self, chain: &FilterChain) -> bool {
        let seq = self.seq.load(Ordering::Relaxed);
        if seq & 1 == 1 {
            return false;
        }
        if self
            .seq
            .compare_exchange(seq, seq + 1, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        fence(Ordering::Release);

        let encoded = encode(chain);
        for (word, value) in self.words.iter().zip(encoded) {
            word.store(value, Ordering::Relaxed);
        }

        self.seq.store(seq + 2, Ordering::Release);
        self.changed.mark();
        true
    }

    /// Copy the current chain, or `None` if a writer kept it busy for
    /// every attempt.
    pub fn try_snapshot(&self) -> Option<FilterChain> {
        let mut words = [0u64; CHAIN_WORDS];
        for _ in 0..READ_ATTEMPTS {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            for (dst, word) in words.iter_mut().zip(&self.words) {
                *dst = word.load(Ordering::Relaxed);
            }
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return Some(decode(&words));
            }
            std::hint::spin_loop();
        }
        None
    }

    /// Number of completed publishes
    #[inline]
    pub fn version(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }

    /// Set by every publish; the GUI takes it on its own timer
    #[inline]
    pub fn changed(&self) -> &ChangeFlag {
        &self.changed
    }
}

impl Default for SharedChain {
    fn default() -> Self {
        Self::new(&FilterChain::default())
    }
}

impl std::fmt::Debug for SharedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedChain")
            .field("version", &self.version())
            .field("changed", &self.changed.is_set())
            .finish()
    }
}

fn encode_stage(stage: &FilterStage, out: &mut [u64]) {
    let c = &stage.coeffs;
    out[0] = c.b0.to_bits();
    out[1] = c.b1.to_bits();
    out[2] = c.b2.to_bits();
    out[3] = c.a1.to_bits();
    out[4] = c.a2.to_bits();
    out[5] = stage.bypassed as u64;
}

fn decode_stage(words: &[u64]) -> FilterStage {
    FilterStage {
        coeffs: BiquadCoeffs {
            b0: f64::from_bits(words[0]),
            b1: f64::from_bits(words[1]),
            b2: f64::from_bits(words[2]),
            a1: f64::from_bits(words[3]),
            a2: f64::from_bits(words[4]),
        },
        bypassed: words[5] != 0,
    }
}

fn encode(chain: &FilterChain) -> [u64; CHAIN_WORDS] {
    let mut out = [0u64; CHAIN_WORDS];
    for (stage, chunk) in chain
        .stages()
        .zip(out[..STAGE_COUNT * WORDS_PER_STAGE].chunks_exact_mut(WORDS_PER_STAGE))
    {
        encode_stage(stage, chunk);
    }
    out[CHAIN_WORDS - 2] = chain.low_cut.bypassed as u64;
    out[CHAIN_WORDS - 1] = chain.high_cut.bypassed as u64;
    out
}

fn decode(words: &[u64; CHAIN_WORDS]) -> FilterChain {
    let mut stages = words[..STAGE_COUNT * WORDS_PER_STAGE]
        .chunks_exact(WORDS_PER_STAGE)
        .map(decode_stage);

    let mut low_cut = CutChain::identity();
    for stage in low_cut.stages.iter_mut() {
        *stage = stages.next().unwrap_or(FilterStage::BYPASSED);
    }
    let peak = stages.next().unwrap_or(FilterStage::UNITY);
    let mut high_cut = CutChain::identity();
    for stage in high_cut.stages.iter_mut() {
        *stage = stages.next().unwrap_or(FilterStage::BYPASSED);
    }
    low_cut.bypassed = words[CHAIN_WORDS - 2] != 0;
    high_cut.bypassed = words[CHAIN_WORDS - 1] != 0;

    FilterChain {
        low_cut,
        peak,
        high_cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seq_core::{ChainSettings, Slope};
    use std::sync::Arc;
    use std::thread;

    fn settings_with(freq: f64, slope: Slope) -> ChainSettings {
        ChainSettings {
            peak_freq: freq,
            peak_gain_db: 6.0,
            low_cut_freq: freq / 10.0,
            high_cut_freq: freq * 4.0,
            low_cut_slope: slope,
            high_cut_slope: slope,
            high_cut_bypassed: true,
            ..ChainSettings::default()
        }
    }

    #[test]
    fn test_change_flag_take_once() {
        let flag = ChangeFlag::default();
        assert!(!flag.take());
        flag.mark();
        flag.mark();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_publish_and_snapshot() {
        let shared = SharedChain::default();
        assert!(shared.changed().take());

        let chain = FilterChain::from_settings(&settings_with(1000.0, Slope::Db36), 48000.0);
        assert!(shared.publish(&chain));
        assert_eq!(shared.version(), 1);
        assert!(shared.changed().take());
        assert_eq!(shared.try_snapshot(), Some(chain));
    }

    #[test]
    fn test_snapshot_never_torn() {
        let chains: Vec<FilterChain> = [(200.0, Slope::Db12), (3000.0, Slope::Db48)]
            .iter()
            .map(|&(f, s)| FilterChain::from_settings(&settings_with(f, s), 48000.0))
            .collect();
        let shared = Arc::new(SharedChain::new(&chains[0]));

        let writer = {
            let shared = Arc::clone(&shared);
            let chains = chains.clone();
            thread::spawn(move || {
                for i in 0..20_000 {
                    shared.publish(&chains[i % 2]);
                }
            })
        };

        let mut seen = 0;
        while !writer.is_finished() || seen == 0 {
            if let Some(snapshot) = shared.try_snapshot() {
                assert!(
                    snapshot == chains[0] || snapshot == chains[1],
                    "torn coefficient set observed"
                );
                seen += 1;
            }
        }
        writer.join().unwrap();
        assert!(seen > 0);
    }
}
