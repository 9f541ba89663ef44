//! Multi-producer multi-consumer bounded queue using per-cell sequence
//! numbers.
//!
//! # Design
//!
//! Each cell pairs a slot with an atomic sequence number:
//!
//! - `sequence == index`: cell is empty, writable by the producer that
//!   claims `tail == index`
//! - `sequence == index + 1`: cell holds data, readable by the consumer
//!   that claims `head == index`
//! - `sequence == index + capacity`: cell recycled, writable next lap
//!
//! The sequence is the only synchronization between producers and
//! consumers on a given cell: the acquire load pairs with the release
//! store of the previous transition, which is what makes the payload
//! visible across threads. `head` and `tail` themselves are claimed with
//! relaxed weak CAS; they order nothing.
//!
//! Push fails (queue full) when a cell's sequence lags the claim
//! position; pop fails (queue empty) symmetrically. Both are reported by
//! value.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

use crate::Full;

struct Cell<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// A bounded lock-free queue for any number of producers and consumers.
///
/// Shared by reference: `push` and `pop` take `&self`. Capacity must be a
/// power of two of at least 2, checked at construction.
///
/// # Example
///
/// ```
/// use lattice_queue::MpmcQueue;
///
/// let q = MpmcQueue::new(8);
/// q.push(1).unwrap();
/// q.push(2).unwrap();
/// assert_eq!(q.pop(), Some(1));
/// assert_eq!(q.pop(), Some(2));
/// ```
pub struct MpmcQueue<T> {
    /// Next position consumers claim.
    head: CachePadded<AtomicUsize>,
    /// Next position producers claim.
    tail: CachePadded<AtomicUsize>,
    buffer: Box<[Cell<T>]>,
    mask: usize,
}

unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T> MpmcQueue<T> {
    /// Creates a queue with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics unless `capacity` is a power of two of at least 2.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 2 && capacity.is_power_of_two(),
            "capacity must be a power of two of at least 2"
        );

        let buffer: Box<[Cell<T>]> = (0..capacity)
            .map(|i| Cell {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            buffer,
            mask: capacity - 1,
        }
    }

    /// Pushes a value into the queue.
    ///
    /// Returns `Err(Full(value))` if the queue is full, returning
    /// ownership of the value to the caller.
    #[must_use = "push returns Err if full, which should be handled"]
    pub fn push(&self, value: T) -> Result<(), Full<T>> {
        let backoff = Backoff::new();
        let mut pos = self.tail.load(Ordering::Relaxed);

        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // Safety: the CAS gave this thread exclusive write
                        // access to the cell until the sequence store.
                        unsafe { (*cell.value.get()).write(value) };
                        cell.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                // The cell has not been recycled yet: a full lap behind.
                return Err(Full(value));
            } else {
                // Another producer claimed this position.
                pos = self.tail.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Pops a value from the queue.
    ///
    /// Returns `None` if the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let backoff = Backoff::new();
        let mut pos = self.head.load(Ordering::Relaxed);

        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let expected = pos.wrapping_add(1);
            let diff = seq as isize - expected as isize;

            if diff == 0 {
                match self.head.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // Safety: the CAS gave this thread exclusive read
                        // access to the cell until the sequence store.
                        let value = unsafe { (*cell.value.get()).assume_init_read() };
                        cell.sequence
                            .store(pos.wrapping_add(self.mask + 1), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                // The cell has not been published yet: queue is empty.
                return None;
            } else {
                // Another consumer claimed this position.
                pos = self.head.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Approximate number of queued elements; may observe a transient
    /// state no single serial moment exhibited.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::SeqCst);
        let head = self.head.load(Ordering::SeqCst);
        (tail.wrapping_sub(head) as isize).max(0) as usize
    }

    /// True when no elements were visible at the time of the call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Drains the queue. Exclusive access is enforced by `&mut`.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<T> Drop for MpmcQueue<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<T> fmt::Debug for MpmcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpmcQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
