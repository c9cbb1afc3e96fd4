//! Lock-free single-producer single-consumer ring buffer for crossing
//! between the audio sample clock and the USB clock.
//!
//! The audio side (codec ISR, sample strobe) and the USB side (endpoint
//! task) run at unrelated rates and priorities. Each direction of the bridge
//! owns one of these queues and uses it from exactly one context per end.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`push()`](SpscQueue::push).
//! - Only ONE context may call [`pop()`](SpscQueue::pop).
//! - The two may run concurrently (ISR vs. task, or two threads).

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A lock-free SPSC queue with `N - 1` usable slots.
///
/// One slot stays empty so that `head == tail` always means "empty".
pub struct SpscQueue<T, const N: usize> {
    buffer: [UnsafeCell<MaybeUninit<T>>; N],
    /// Next slot to write (producer only).
    head: AtomicUsize,
    /// Next slot to read (consumer only).
    tail: AtomicUsize,
}

// SAFETY: values move between contexts, hence `T: Send`. Each index is only
// advanced by its own side, and the Release/Acquire pairs below publish the
// slot contents before the index that exposes them.
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}
unsafe impl<T: Send, const N: usize> Send for SpscQueue<T, N> {}

impl<T, const N: usize> SpscQueue<T, N> {
    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// `N` must be at least 2 (checked at compile time in const contexts).
    pub const fn new() -> Self {
        assert!(N >= 2, "SPSC queue needs at least 2 slots (1 usable)");

        SpscQueue {
            // SAFETY: an array of `UnsafeCell<MaybeUninit<T>>` needs no
            // initialization.
            buffer: unsafe { MaybeUninit::<[UnsafeCell<MaybeUninit<T>>; N]>::uninit().assume_init() },
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Usable capacity.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Push a value into the queue (producer side).
    ///
    /// Returns `Err(val)` if the queue is full, returning ownership to the caller.
    pub fn push(&self, val: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next_head = (head + 1) % N;

        if next_head == self.tail.load(Ordering::Acquire) {
            return Err(val); // Queue is full
        }

        // SAFETY: We are the sole producer and `head` is only advanced by us.
        // `next_head != tail` guarantees this slot is not occupied by the consumer.
        unsafe {
            (*self.buffer[head].get()).write(val);
        }

        // Release ordering ensures the buffer write is visible before head advances.
        self.head.store(next_head, Ordering::Release);
        Ok(())
    }

    /// Pop a value from the queue (consumer side).
    ///
    /// Returns `None` if the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None; // Queue is empty
        }

        // SAFETY: We are the sole consumer and `tail` is only advanced by us.
        // `tail != head` guarantees this slot contains a valid value.
        let val = unsafe { (*self.buffer[tail].get()).assume_init_read() };

        // Release ordering ensures the read completes before tail advances,
        // freeing the slot for the producer.
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(val)
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    /// Check if the queue is full.
    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + 1) % N == tail
    }

    /// Return the number of items currently in the queue.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }
}

impl<T, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscQueue<T, N> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn frames_cross_in_order() {
        let q: SpscQueue<[i32; 4], 4> = SpscQueue::new();
        assert_eq!(q.capacity(), 3);
        assert!(q.is_empty());

        q.push([1, 2, 3, 4]).unwrap();
        q.push([5, 6, 7, 8]).unwrap();
        assert_eq!(q.len(), 2);

        assert_eq!(q.pop(), Some([1, 2, 3, 4]));
        assert_eq!(q.pop(), Some([5, 6, 7, 8]));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn full_queue_hands_value_back() {
        let q: SpscQueue<i32, 3> = SpscQueue::new();
        q.push(-1).unwrap();
        q.push(-2).unwrap();
        assert!(q.is_full());
        assert_eq!(q.push(-3), Err(-3));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn indices_wrap() {
        let q: SpscQueue<u32, 3> = SpscQueue::new();
        for round in 0..10u32 {
            q.push(round).unwrap();
            q.push(round + 100).unwrap();
            assert_eq!(q.pop(), Some(round));
            assert_eq!(q.pop(), Some(round + 100));
            assert!(q.is_empty());
        }
    }

    #[test]
    fn producer_and_consumer_threads() {
        use std::sync::Arc;
        use std::thread;

        let q: Arc<SpscQueue<u32, 8>> = Arc::new(SpscQueue::new());
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    while q.push(i).is_err() {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut expected = 0u32;
        while expected < 1000 {
            match q.pop() {
                Some(v) => {
                    assert_eq!(v, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn drop_releases_queued_values() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        DROPS.store(0, Ordering::Relaxed);
        {
            let q: SpscQueue<Counted, 4> = SpscQueue::new();
            let _ = q.push(Counted);
            let _ = q.push(Counted);
        }
        assert_eq!(DROPS.load(Ordering::Relaxed), 2);
    }
}
