//! Lock-free single-producer/single-consumer FIFO of fixed-size items
//!
//! Goals:
//! - Audio callback NEVER waits on the consumer
//! - Audio callback NEVER locks a mutex
//! - Audio callback NEVER allocates
//!
//! Slots are allocated once in [`fifo`] and reused: `push` copies into a slot
//! with `clone_from`, `pop` copies out the same way, so `Vec` items keep their
//! capacity and no heap traffic happens after construction. Read and write
//! positions are monotonically increasing counters; the slot index is the
//! counter masked by the (power-of-two) capacity.

use crossbeam_utils::CachePadded;
use seq_core::{Sample, SeqError, SeqResult};
use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

struct Shared<T> {
    slots: Box<[UnsafeCell<T>]>,
    mask: usize,
    /// Write position (producer only)
    write_pos: CachePadded<AtomicUsize>,
    /// Read position (consumer only)
    read_pos: CachePadded<AtomicUsize>,
    /// Pushes rejected because the ring was full
    dropped: AtomicU64,
}

// SAFETY: a slot is only touched by the producer while it is outside
// [read_pos, write_pos) and only by the consumer while it is inside; the
// Release/Acquire pairs on the positions hand each slot over.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn available(&self) -> usize {
        // Read first: write only grows, so the difference never underflows.
        let r = self.read_pos.load(Ordering::Acquire);
        let w = self.write_pos.load(Ordering::Acquire);
        w.wrapping_sub(r).min(self.capacity())
    }
}

/// Create a FIFO with `capacity` slots (rounded up to a power of two), each
/// initialised by `init`.
pub fn fifo<T: Send>(
    capacity: usize,
    mut init: impl FnMut() -> T,
) -> (FifoProducer<T>, FifoConsumer<T>) {
    let capacity = capacity.max(1).next_power_of_two();
    let slots: Box<[UnsafeCell<T>]> = (0..capacity).map(|_| UnsafeCell::new(init())).collect();
    let shared = Arc::new(Shared {
        slots,
        mask: capacity - 1,
        write_pos: CachePadded::new(AtomicUsize::new(0)),
        read_pos: CachePadded::new(AtomicUsize::new(0)),
        dropped: AtomicU64::new(0),
    });

    (
        FifoProducer {
            shared: Arc::clone(&shared),
        },
        FifoConsumer { shared },
    )
}

/// Writing half (audio thread)
pub struct FifoProducer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> FifoProducer<T> {
    /// Fill the next free slot in place. Returns false, leaving the ring
    /// untouched, when it is full.
    #[inline]
    pub fn push_with(&mut self, fill: impl FnOnce(&mut T)) -> bool {
        let s = &*self.shared;
        let w = s.write_pos.load(Ordering::Relaxed);
        let r = s.read_pos.load(Ordering::Acquire);
        if w.wrapping_sub(r) >= s.capacity() {
            s.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: the slot at `w` is outside the readable range (see Shared).
        let slot = unsafe { &mut *s.slots[w & s.mask].get() };
        fill(slot);

        s.write_pos.store(w.wrapping_add(1), Ordering::Release);
        true
    }

    #[inline]
    pub fn available_count(&self) -> usize {
        self.shared.available()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

impl<T: Clone + Send> FifoProducer<T> {
    /// Copy `item` into the ring; false when full
    #[inline]
    pub fn push(&mut self, item: &T) -> bool {
        self.push_with(|slot| slot.clone_from(item))
    }
}

/// Reading half (GUI/analysis thread)
pub struct FifoConsumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> FifoConsumer<T> {
    /// Hand the oldest slot to `read`. Returns false when empty.
    #[inline]
    pub fn pop_with(&mut self, read: impl FnOnce(&T)) -> bool {
        let s = &*self.shared;
        let r = s.read_pos.load(Ordering::Relaxed);
        let w = s.write_pos.load(Ordering::Acquire);
        if r == w {
            return false;
        }

        // SAFETY: the slot at `r` is inside the readable range (see Shared).
        let slot = unsafe { &*s.slots[r & s.mask].get() };
        read(slot);

        s.read_pos.store(r.wrapping_add(1), Ordering::Release);
        true
    }

    #[inline]
    pub fn available_count(&self) -> usize {
        self.shared.available()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Total pushes rejected because the ring was full
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl<T: Clone + Send> FifoConsumer<T> {
    /// Copy the oldest item into `out`; false when empty
    #[inline]
    pub fn pop(&mut self, out: &mut T) -> bool {
        self.pop_with(|slot| out.clone_from(slot))
    }
}

/// Audio-side collector that turns host buffers of any length into
/// fixed-size blocks and pushes each completed block into the FIFO.
pub struct ChannelSampleFifo {
    producer: FifoProducer<Vec<Sample>>,
    block: Vec<Sample>,
    filled: usize,
}

impl ChannelSampleFifo {
    /// Build the collector and the consumer half of its FIFO
    pub fn new(
        block_size: usize,
        capacity: usize,
    ) -> SeqResult<(Self, FifoConsumer<Vec<Sample>>)> {
        if block_size == 0 {
            return Err(SeqError::InvalidBlockSize(block_size));
        }
        let (producer, consumer) = fifo(capacity, || vec![0.0; block_size]);
        log::debug!(
            "Sample FIFO prepared: {} blocks of {} samples",
            producer.capacity(),
            block_size
        );
        Ok((
            Self {
                producer,
                block: vec![0.0; block_size],
                filled: 0,
            },
            consumer,
        ))
    }

    /// Append samples; completes and pushes as many blocks as they fill
    pub fn update(&mut self, mut samples: &[Sample]) {
        while !samples.is_empty() {
            let space = self.block.len() - self.filled;
            let n = space.min(samples.len());
            self.block[self.filled..self.filled + n].copy_from_slice(&samples[..n]);
            self.filled += n;
            samples = &samples[n..];

            if self.filled == self.block.len() {
                // A full ring drops this block; the analyzer just sees older data.
                let block = &self.block;
                self.producer.push_with(|slot| slot.copy_from_slice(block));
                self.filled = 0;
            }
        }
    }

    #[inline]
    pub fn available_count(&self) -> usize {
        self.producer.available_count()
    }
}

/// Single-threaded bounded queue that drops its oldest entry on overflow.
///
/// Used where only freshness matters (FFT blocks, finished paths). Storage
/// is preallocated and items are copied with `clone_from`.
#[derive(Debug, Clone)]
pub struct LatestQueue<T> {
    slots: Vec<T>,
    head: usize,
    len: usize,
    overwritten: u64,
}

impl<T: Clone> LatestQueue<T> {
    pub fn new(depth: usize, mut init: impl FnMut() -> T) -> Self {
        let depth = depth.max(2);
        Self {
            slots: (0..depth).map(|_| init()).collect(),
            head: 0,
            len: 0,
            overwritten: 0,
        }
    }

    /// Copy `item` in, discarding the oldest entry if full
    pub fn push(&mut self, item: &T) {
        self.push_with(|slot| slot.clone_from(item));
    }

    /// Fill the next slot in place, discarding the oldest entry if full
    pub fn push_with(&mut self, fill: impl FnOnce(&mut T)) {
        let depth = self.slots.len();
        if self.len == depth {
            self.head = (self.head + 1) % depth;
            self.len -= 1;
            self.overwritten += 1;
        }
        let tail = (self.head + self.len) % depth;
        fill(&mut self.slots[tail]);
        self.len += 1;
    }

    /// Copy the oldest entry into `out`
    pub fn pop(&mut self, out: &mut T) -> bool {
        if self.len == 0 {
            return false;
        }
        out.clone_from(&self.slots[self.head]);
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        true
    }

    /// Discard everything but the newest entry and copy it into `out`
    pub fn pop_latest(&mut self, out: &mut T) -> bool {
        if self.len == 0 {
            return false;
        }
        let newest = (self.head + self.len - 1) % self.slots.len();
        out.clone_from(&self.slots[newest]);
        self.head = 0;
        self.len = 0;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries discarded because the queue was full
    #[inline]
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        let (tx, rx) = fifo(30, || 0u32);
        assert_eq!(tx.capacity(), 32);
        assert_eq!(rx.capacity(), 32);
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let (mut tx, mut rx) = fifo(8, || vec![0.0; 4]);
        for k in 0..8 {
            let block: Vec<f64> = (0..4).map(|i| (k * 10 + i) as f64).collect();
            assert!(tx.push(&block));
        }
        assert_eq!(rx.available_count(), 8);

        let mut out = vec![0.0; 4];
        for k in 0..8 {
            assert!(rx.pop(&mut out));
            let expected: Vec<f64> = (0..4).map(|i| (k * 10 + i) as f64).collect();
            assert_eq!(out, expected);
        }
        assert!(!rx.pop(&mut out));
        assert_eq!(rx.available_count(), 0);
    }

    #[test]
    fn test_full_rejects_newest() {
        let (mut tx, mut rx) = fifo(4, || 0i32);
        for v in 0..4 {
            assert!(tx.push(&v));
        }
        assert!(!tx.push(&99));
        assert_eq!(rx.dropped_count(), 1);
        assert_eq!(tx.available_count(), 4);

        let mut out = -1;
        assert!(rx.pop(&mut out));
        assert_eq!(out, 0);
        assert!(tx.push(&4));
        let mut drained = Vec::new();
        while rx.pop(&mut out) {
            drained.push(out);
        }
        assert_eq!(drained, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cross_thread_stream() {
        let (mut tx, mut rx) = fifo(16, || 0u64);
        let producer = thread::spawn(move || {
            let mut next = 0u64;
            while next < 50_000 {
                if tx.push(&next) {
                    next += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        });

        let mut expected = 0u64;
        let mut out = 0u64;
        while expected < 50_000 {
            if rx.pop(&mut out) {
                assert_eq!(out, expected);
                expected += 1;
            }
        }
        producer.join().unwrap();
    }

    #[test]
    fn test_sample_fifo_collects_blocks() {
        let (mut collector, mut rx) = ChannelSampleFifo::new(4, 8).unwrap();
        collector.update(&[1.0, 2.0, 3.0]);
        assert_eq!(rx.available_count(), 0);
        collector.update(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(rx.available_count(), 2);

        let mut out = vec![0.0; 4];
        assert!(rx.pop(&mut out));
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(rx.pop(&mut out));
        assert_eq!(out, vec![5.0, 6.0, 7.0, 8.0]);
        assert!(!rx.pop(&mut out));
    }

    #[test]
    fn test_sample_fifo_rejects_zero_block() {
        assert!(matches!(
            ChannelSampleFifo::new(0, 8),
            Err(SeqError::InvalidBlockSize(0))
        ));
    }

    #[test]
    fn test_latest_queue_drops_oldest() {
        let mut q = LatestQueue::new(3, || 0);
        for v in 1..=5 {
            q.push(&v);
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.overwritten(), 2);

        let mut out = 0;
        assert!(q.pop(&mut out));
        assert_eq!(out, 3);
        assert!(q.pop_latest(&mut out));
        assert_eq!(out, 5);
        assert!(q.is_empty());
        assert!(!q.pop(&mut out));
    }
}
