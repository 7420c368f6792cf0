//! Fixed-capacity sample ring with monotonic enqueue/dequeue counters.
//!
//! One producer pushes. Removals (`pop`, `pop_block_into`, `discard`) advance the
//! head with a compare-and-swap, so the processing worker can trim the processed
//! queue while the render callback pops from it, without locks on either side.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
#[repr(align(64))]
struct Counter(AtomicU64);

/// Lock-free FIFO of `f32` samples.
///
/// `enqueued_total` is the tail position and `dequeued_total` the head position,
/// so `len() == enqueued_total() - dequeued_total()` holds by construction.
#[derive(Debug)]
pub struct SampleQueue {
    slots: Box<[AtomicF32]>,
    mask: u64,
    head: Counter,
    tail: Counter,
}

impl SampleQueue {
    /// Capacity is rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let slots: Vec<AtomicF32> = (0..capacity).map(|_| AtomicF32::new(0.0)).collect();

        Self {
            slots: slots.into_boxed_slice(),
            mask: capacity as u64 - 1,
            head: Counter::default(),
            tail: Counter::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Samples currently queued.
    #[inline]
    pub fn len(&self) -> usize {
        // Head first: the tail can only have grown by the time it is read.
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        (tail - head) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free slots left for the producer.
    #[inline]
    pub fn vacant(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Total samples ever pushed since creation or the last reset.
    #[inline]
    pub fn enqueued_total(&self) -> u64 {
        self.tail.0.load(Ordering::Acquire)
    }

    /// Total samples ever removed since creation or the last reset.
    #[inline]
    pub fn dequeued_total(&self) -> u64 {
        self.head.0.load(Ordering::Acquire)
    }

    /// Append one sample. Producer side only.
    ///
    /// Returns `false` when the ring is full; the sample is not stored.
    #[inline]
    pub fn push(&self, sample: f32) -> bool {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Acquire);
        if tail - head >= self.capacity() as u64 {
            return false;
        }
        self.slots[(tail & self.mask) as usize].store(sample, Ordering::Relaxed);
        self.tail.0.store(tail + 1, Ordering::Release);
        true
    }

    /// Append as many samples as fit, in order. Producer side only.
    ///
    /// Returns the number of samples stored.
    #[inline]
    pub fn push_slice(&self, samples: &[f32]) -> usize {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Acquire);
        let vacant = self.capacity() - (tail - head) as usize;
        let count = samples.len().min(vacant);

        for (i, &sample) in samples[..count].iter().enumerate() {
            self.slots[((tail + i as u64) & self.mask) as usize].store(sample, Ordering::Relaxed);
        }
        self.tail.0.store(tail + count as u64, Ordering::Release);
        count
    }

    /// Remove and return the oldest sample, or `None` if empty. Never blocks.
    #[inline]
    pub fn pop(&self) -> Option<f32> {
        loop {
            let head = self.head.0.load(Ordering::Acquire);
            let tail = self.tail.0.load(Ordering::Acquire);
            if head == tail {
                return None;
            }
            let sample = self.slots[(head & self.mask) as usize].load(Ordering::Relaxed);
            if self
                .head
                .0
                .compare_exchange_weak(head, head + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(sample);
            }
        }
    }

    /// Oldest sample without removing it.
    #[inline]
    pub fn peek(&self) -> Option<f32> {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        Some(self.slots[(head & self.mask) as usize].load(Ordering::Relaxed))
    }

    /// Remove exactly `out.len()` samples into `out`, or nothing at all.
    ///
    /// Returns `false` (queue unchanged) when fewer samples are queued.
    pub fn pop_block_into(&self, out: &mut [f32]) -> bool {
        let n = out.len() as u64;
        loop {
            let head = self.head.0.load(Ordering::Acquire);
            let tail = self.tail.0.load(Ordering::Acquire);
            if tail - head < n {
                return false;
            }
            for (i, slot) in out.iter_mut().enumerate() {
                let index = ((head + i as u64) & self.mask) as usize;
                *slot = self.slots[index].load(Ordering::Relaxed);
            }
            if self
                .head
                .0
                .compare_exchange_weak(head, head + n, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Allocating form of [`pop_block_into`](Self::pop_block_into).
    pub fn pop_block(&self, n: usize) -> Option<Vec<f32>> {
        let mut block = vec![0.0; n];
        self.pop_block_into(&mut block).then_some(block)
    }

    /// Drop up to `count` of the oldest samples. Returns how many were dropped.
    pub fn discard(&self, count: usize) -> usize {
        loop {
            let head = self.head.0.load(Ordering::Acquire);
            let tail = self.tail.0.load(Ordering::Acquire);
            let dropped = (tail - head).min(count as u64);
            if dropped == 0 {
                return 0;
            }
            if self
                .head
                .0
                .compare_exchange_weak(head, head + dropped, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return dropped as usize;
            }
        }
    }

    /// Drop everything currently queued. Counters keep counting.
    pub fn clear(&self) -> usize {
        self.discard(usize::MAX)
    }

    /// Zero both counters.
    ///
    /// Only valid while no producer or consumer is running; the pipeline calls it
    /// with the callback gate closed and the worker joined.
    pub(crate) fn reset(&self) {
        self.head.0.store(0, Ordering::Release);
        self.tail.0.store(0, Ordering::Release);
    }
}
