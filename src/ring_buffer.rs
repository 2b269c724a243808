//! Bounded SPSC (single-producer/single-consumer) ring buffer.
//!
//! Exactly one producer thread may call [`SpscRingBuffer::try_push`] /
//! [`SpscRingBuffer::try_push_batch`]; exactly one consumer thread may call
//! `try_pop` / `try_pop_batch`. Calling a producer method from the consumer
//! thread (or vice versa), or from more than one thread, is undefined
//! behaviour — the buffer performs no cross-checking of caller identity.
//!
//! Usable capacity is `N - 1`: one slot is always kept empty to distinguish
//! a full buffer from an empty one without a separate counter.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A bounded lock-free queue between one producer and one consumer.
///
/// `N` must be a power of two; [`SpscRingBuffer::new`] panics otherwise so
/// the mis-sizing is caught at construction rather than silently truncating
/// the index mask.
pub struct SpscRingBuffer<T, const N: usize> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    // Only the producer writes `tail`; only the consumer writes `head`. Each
    // lives on its own cache line so producer and consumer progress without
    // false-sharing invalidation traffic.
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

// SAFETY: the SPSC protocol (documented above) ensures the producer and
// consumer never touch the same slot concurrently; `T: Send` is sufficient
// to move values across the thread boundary the buffer connects.
unsafe impl<T: Send, const N: usize> Sync for SpscRingBuffer<T, N> {}
unsafe impl<T: Send, const N: usize> Send for SpscRingBuffer<T, N> {}

impl<T, const N: usize> SpscRingBuffer<T, N> {
    /// Builds an empty ring buffer of capacity `N` (usable capacity `N - 1`).
    ///
    /// # Panics
    /// Panics if `N` is not a power of two, or if `N < 2`.
    pub fn new() -> Self {
        assert!(N >= 2, "ring buffer capacity must be at least 2");
        assert!(N.is_power_of_two(), "ring buffer capacity must be a power of two");
        let buffer = (0..N)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        SpscRingBuffer {
            buffer,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    #[inline]
    const fn mask(index: usize) -> usize {
        index & (N - 1)
    }

    /// Total slot count, including the one reserved slot.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Producer-only. Pushes `value`; returns `false` without touching
    /// `value`'s ownership semantics (it is dropped) iff the buffer is full.
    pub fn try_push(&self, value: T) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let next_tail = Self::mask(tail + 1);
        if next_tail == self.head.load(Ordering::Acquire) {
            return false;
        }
        // SAFETY: slot `tail` is not owned by the consumer (it only advances
        // up to `head`, which is strictly behind `next_tail` here).
        unsafe {
            (*self.buffer[tail].get()).write(value);
        }
        // Release: publishes the write above before the index becomes
        // visible to the consumer's Acquire load.
        self.tail.store(next_tail, Ordering::Release);
        true
    }

    /// Consumer-only. Pops the oldest value, or `None` if empty.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: slot `head` was published by the producer's Release store
        // to `tail` and is not touched by the producer again until this
        // consumer advances `head` past it.
        let value = unsafe { (*self.buffer[head].get()).assume_init_read() };
        self.head.store(Self::mask(head + 1), Ordering::Release);
        Some(value)
    }

    /// Producer-only. Pushes items from `iter` until the buffer is full or
    /// `iter` is exhausted. Returns the number of items actually pushed;
    /// relative order is preserved.
    pub fn try_push_batch<I: Iterator<Item = T>>(&self, iter: &mut I) -> usize {
        let mut pushed = 0;
        while let Some(value) = iter.next() {
            if !self.try_push(value) {
                break;
            }
            pushed += 1;
        }
        pushed
    }

    /// Consumer-only. Pops up to `max` items, appending them (in FIFO
    /// order) to `out`. Returns the number popped. Reuses `out`'s existing
    /// capacity, so repeated calls with a caller-owned, pre-sized `Vec`
    /// stay allocation-free after warm-up.
    pub fn try_pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut popped = 0;
        while popped < max {
            match self.try_pop() {
                Some(value) => {
                    out.push(value);
                    popped += 1;
                }
                None => break,
            }
        }
        popped
    }

    /// Approximate occupied-slot count. Exact from the calling side's own
    /// vantage (a producer's view of `size` only grows when it isn't
    /// pushing; a consumer's only shrinks when it isn't popping) but may be
    /// stale with respect to the other side.
    pub fn size(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        Self::mask(tail.wrapping_sub(head).wrapping_add(N))
    }

    /// `true` iff the buffer holds no items, from the caller's vantage.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// `true` iff the buffer is at usable capacity, from the caller's vantage.
    pub fn is_full(&self) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        Self::mask(tail + 1) == self.head.load(Ordering::Acquire)
    }
}

impl<T, const N: usize> Default for SpscRingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscRingBuffer<T, N> {
    fn drop(&mut self) {
        // Drop any values still queued between head and tail.
        let mut head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        while head != tail {
            unsafe {
                (*self.buffer[head].get()).assume_init_drop();
            }
            head = Self::mask(head + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two_capacity() {
        let _: SpscRingBuffer<u8, 3> = SpscRingBuffer::new();
    }

    #[test]
    fn usable_capacity_is_one_less_than_slot_count() {
        let rb: SpscRingBuffer<u8, 4> = SpscRingBuffer::new();
        assert_eq!(rb.capacity(), 3);
        for v in 0..3u8 {
            assert!(rb.try_push(v));
        }
        assert!(!rb.try_push(99));
        assert!(rb.is_full());
    }

    #[test]
    fn fifo_order_is_preserved() {
        let rb: SpscRingBuffer<u32, 8> = SpscRingBuffer::new();
        for v in 0..5u32 {
            assert!(rb.try_push(v));
        }
        let mut popped = Vec::new();
        while let Some(v) = rb.try_pop() {
            popped.push(v);
        }
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn batch_push_and_pop_respect_order_and_limits() {
        let rb: SpscRingBuffer<u32, 8> = SpscRingBuffer::new();
        let mut source = 0..20u32;
        let pushed = rb.try_push_batch(&mut source);
        assert_eq!(pushed, 7); // usable capacity is 7

        let mut out = Vec::new();
        let popped = rb.try_pop_batch(&mut out, 3);
        assert_eq!(popped, 3);
        assert_eq!(out, vec![0, 1, 2]);

        let popped = rb.try_pop_batch(&mut out, 10);
        assert_eq!(popped, 4);
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_pop_returns_none() {
        let rb: SpscRingBuffer<u32, 4> = SpscRingBuffer::new();
        assert!(rb.try_pop().is_none());
        assert!(rb.is_empty());
    }

    #[test]
    fn concurrent_producer_and_consumer_observe_full_fifo_prefix() {
        let rb: Arc<SpscRingBuffer<u64, 1024>> = Arc::new(SpscRingBuffer::new());
        const TOTAL: u64 = 200_000;

        let producer_rb = rb.clone();
        let producer = thread::spawn(move || {
            let mut next = 0u64;
            while next < TOTAL {
                if producer_rb.try_push(next) {
                    next += 1;
                }
            }
        });

        let consumer_rb = rb.clone();
        let consumer = thread::spawn(move || {
            let mut expected = 0u64;
            while expected < TOTAL {
                if let Some(v) = consumer_rb.try_pop() {
                    assert_eq!(v, expected);
                    expected += 1;
                }
            }
            expected
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        assert_eq!(received, TOTAL);
    }

    #[test]
    fn drop_releases_queued_items() {
        let rb: SpscRingBuffer<Vec<u8>, 4> = SpscRingBuffer::new();
        assert!(rb.try_push(vec![1, 2, 3]));
        assert!(rb.try_push(vec![4, 5]));
        drop(rb); // must not leak or double-free under miri
    }
}
