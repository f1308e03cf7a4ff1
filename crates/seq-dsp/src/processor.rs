//! Audio-thread processor: parameters in, filtered audio and analyzer taps out

use seq_core::{AnalyzerConfig, ParameterStore, Sample, SeqError, SeqResult};
use std::sync::Arc;

use crate::fifo::{ChannelSampleFifo, FifoConsumer};
use crate::filter_chain::{FilterChain, MonoChain};
use crate::shared::SharedChain;
use crate::{MonoProcessor, Processor};

/// Consumer halves handed to the visualization side by [`EqProcessor::prepare`]
pub struct AnalysisTaps {
    pub left: FifoConsumer<Vec<Sample>>,
    pub right: FifoConsumer<Vec<Sample>>,
    pub sample_rate: f64,
    pub block_size: usize,
}

/// Stereo EQ processor.
///
/// Each block it checks the parameter store's version and, if anything
/// moved, redesigns the chain, loads it into both channels and publishes it
/// to the [`SharedChain`] for the response display. Post-filter samples go
/// to one [`ChannelSampleFifo`] per channel.
pub struct EqProcessor {
    params: Arc<ParameterStore>,
    shared: Arc<SharedChain>,
    chain: FilterChain,
    left: MonoChain,
    right: MonoChain,
    left_tap: Option<ChannelSampleFifo>,
    right_tap: Option<ChannelSampleFifo>,
    sample_rate: f64,
    seen_version: Option<u64>,
    publish_pending: bool,
}

impl EqProcessor {
    pub fn new(params: Arc<ParameterStore>, shared: Arc<SharedChain>) -> Self {
        Self {
            params,
            shared,
            chain: FilterChain::default(),
            left: MonoChain::new(),
            right: MonoChain::new(),
            left_tap: None,
            right_tap: None,
            sample_rate: 48000.0,
            seen_version: None,
            publish_pending: false,
        }
    }

    /// Size everything for a new stream. Not real-time safe.
    ///
    /// Returns fresh analyzer taps; consumers from an earlier `prepare`
    /// stop receiving data.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        block_size: usize,
        config: &AnalyzerConfig,
    ) -> SeqResult<AnalysisTaps> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SeqError::InvalidSampleRate(sample_rate.max(0.0) as u32));
        }
        config.validate()?;

        let (left_tap, left) = ChannelSampleFifo::new(block_size, config.fifo_capacity)?;
        let (right_tap, right) = ChannelSampleFifo::new(block_size, config.fifo_capacity)?;

        self.left_tap = Some(left_tap);
        self.right_tap = Some(right_tap);
        self.sample_rate = sample_rate;
        self.seen_version = None;
        self.reset();
        self.update_filters();

        log::info!(
            "EQ prepared: {} Hz, {} samples per block, {} FIFO slots",
            sample_rate,
            block_size,
            config.fifo_capacity
        );

        Ok(AnalysisTaps {
            left,
            right,
            sample_rate,
            block_size,
        })
    }

    /// Filter one channel in place (left chain and tap)
    pub fn process_mono(&mut self, buffer: &mut [Sample]) {
        self.update_filters();
        self.left.process_block(buffer);
        if let Some(tap) = self.left_tap.as_mut() {
            tap.update(buffer);
        }
    }

    /// Filter both channels in place
    pub fn process_stereo(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        self.update_filters();
        self.left.process_block(left);
        self.right.process_block(right);
        if let Some(tap) = self.left_tap.as_mut() {
            tap.update(left);
        }
        if let Some(tap) = self.right_tap.as_mut() {
            tap.update(right);
        }
    }

    /// Pick up parameter changes; allocation-free
    fn update_filters(&mut self) {
        let version = self.params.version();
        if self.seen_version != Some(version) {
            let settings = self.params.chain_settings();
            self.chain.update(&settings, self.sample_rate);
            self.left.apply(&self.chain);
            self.right.apply(&self.chain);
            self.seen_version = Some(version);
            self.publish_pending = true;
        }

        if self.publish_pending {
            self.publish_pending = !self.shared.publish(&self.chain);
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Chain currently loaded on the audio side
    #[inline]
    pub fn current_chain(&self) -> &FilterChain {
        &self.chain
    }
}

impl Processor for EqProcessor {
    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
