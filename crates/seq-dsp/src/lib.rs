//! seq-dsp: Real-time DSP for the SimpleEQ core
//!
//! ## Modules
//! - `biquad` - TDF-II biquad sections and their coefficient designs
//! - `filter_chain` - Peak + low-cut/high-cut Butterworth chain from `ChainSettings`
//! - `shared` - Seqlock coefficient snapshot and change flag shared with the GUI
//! - `fifo` - Lock-free SPSC block FIFO and the audio-side sample collector
//! - `window` - Window functions for spectrum analysis
//! - `analysis` - Rolling accumulator and windowed FFT magnitude generator
//! - `processor` - Audio-side processor tying parameters, chain and analyzer taps

pub mod analysis;
pub mod biquad;
pub mod fifo;
pub mod filter_chain;
pub mod processor;
pub mod shared;
pub mod window;

pub use analysis::{FftDataGenerator, MonoAccumulator};
pub use biquad::{BiquadCoeffs, BiquadTDF2};
pub use fifo::{ChannelSampleFifo, FifoConsumer, FifoProducer, LatestQueue, fifo};
pub use filter_chain::{CutChain, FilterChain, FilterStage, MonoChain, MAX_CUT_STAGES};
pub use processor::{AnalysisTaps, EqProcessor};
pub use shared::{ChangeFlag, SharedChain};
pub use window::WindowTable;

use seq_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
