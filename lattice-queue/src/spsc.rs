//! Single-producer single-consumer queue using cached indices.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Shared:                                                     │
//! │   tail: CachePadded<AtomicUsize>   ← Producer writes        │
//! │   head: CachePadded<AtomicUsize>   ← Consumer writes        │
//! │   buffer: *mut T, slots                                     │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ Producer:           │     │ Consumer:           │
//! │   local_tail        │     │   local_head        │
//! │   cached_head       │     │   cached_tail       │
//! │   buffer, slots     │     │   buffer, slots     │
//! └─────────────────────┘     └─────────────────────┘
//! ```
//!
//! Producer and consumer each keep a private copy of the other side's
//! index plus the buffer descriptor, refreshing from the shared atomic
//! only when the cache says the queue is full (producer) or empty
//! (consumer). The indices live on separate cache lines, so the fast path
//! never bounces the opposite side's line.
//!
//! One slot is always left empty to distinguish full (`next(tail) ==
//! head`) from empty (`head == tail`); [`ring_buffer`] hides this by
//! allocating one extra slot so the usable capacity equals the request,
//! while [`ring_buffer_exact`] exposes the raw slot count. Capacity is
//! *not* rounded to a power of two; indices advance modulo the slot
//! count.
//!
//! # Example
//!
//! ```
//! use lattice_queue::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(1024);
//!
//! tx.push(42).unwrap();
//! assert_eq!(rx.pop(), Some(42));
//! ```

use std::fmt;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use crate::Full;

/// Creates a bounded SPSC ring with a usable capacity of exactly
/// `capacity` elements (one extra slot is reserved internally).
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn ring_buffer<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity > 0, "a ring needs a non-zero capacity");
    ring_buffer_exact(capacity.checked_add(1).expect("capacity too large"))
}

/// Creates a bounded SPSC ring over exactly `slots` slots. One slot is
/// always kept empty, so the usable capacity is `slots - 1`.
///
/// # Panics
///
/// Panics if `slots < 2`.
pub fn ring_buffer_exact<T>(slots: usize) -> (Producer<T>, Consumer<T>) {
    assert!(slots >= 2, "a ring needs at least 2 slots");

    let buffer = ManuallyDrop::new(Vec::<T>::with_capacity(slots)).as_mut_ptr();

    let shared = Arc::new(Shared {
        tail: CachePadded::new(AtomicUsize::new(0)),
        head: CachePadded::new(AtomicUsize::new(0)),
        buffer,
        slots,
    });

    (
        Producer {
            local_tail: 0,
            cached_head: 0,
            buffer,
            slots,
            shared: Arc::clone(&shared),
        },
        Consumer {
            local_head: 0,
            cached_tail: 0,
            buffer,
            slots,
            shared,
        },
    )
}

/// Advances an index by one, wrapping at the slot count.
#[inline(always)]
fn next(index: usize, slots: usize) -> usize {
    let next = index + 1;
    if next == slots { 0 } else { next }
}

/// Advances an index by `count`, wrapping at the slot count.
#[inline(always)]
fn advance(index: usize, count: usize, slots: usize) -> usize {
    debug_assert!(count < slots);
    let advanced = index + count;
    if advanced >= slots {
        advanced - slots
    } else {
        advanced
    }
}

/// Free slots visible with the given head snapshot (one slot reserved).
#[inline(always)]
fn free_count(tail: usize, head: usize, slots: usize) -> usize {
    (head + slots - tail - 1) % slots
}

/// Occupied slots visible with the given tail snapshot.
#[inline(always)]
fn occupied_count(head: usize, tail: usize, slots: usize) -> usize {
    (tail + slots - head) % slots
}

#[repr(C)]
struct Shared<T> {
    tail: CachePadded<AtomicUsize>,
    head: CachePadded<AtomicUsize>,
    buffer: *mut T,
    slots: usize,
}

unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);

        let mut i = head;
        while i != tail {
            unsafe { self.buffer.add(i).drop_in_place() };
            i = next(i, self.slots);
        }

        unsafe {
            let _ = Vec::from_raw_parts(self.buffer, 0, self.slots);
        }
    }
}

/// The producer endpoint of an SPSC queue.
#[repr(C)]
pub struct Producer<T> {
    local_tail: usize,
    cached_head: usize,
    buffer: *mut T,
    slots: usize,
    shared: Arc<Shared<T>>,
}

unsafe impl<T: Send> Send for Producer<T> {}

impl<T> Producer<T> {
    /// Pushes a value into the queue.
    ///
    /// Returns `Err(Full(value))` if the queue is full, returning
    /// ownership of the value to the caller.
    #[inline]
    #[must_use = "push returns Err if full, which should be handled"]
    pub fn push(&mut self, value: T) -> Result<(), Full<T>> {
        let tail = self.local_tail;
        let next = next(tail, self.slots);

        if next == self.cached_head {
            self.cached_head = self.shared.head.load(Ordering::Acquire);
            if next == self.cached_head {
                return Err(Full(value));
            }
        }

        unsafe { self.buffer.add(tail).write(value) };
        self.shared.tail.store(next, Ordering::Release);
        self.local_tail = next;

        Ok(())
    }

    /// Pushes clones of as many leading elements of `values` as fit.
    /// Returns the number pushed.
    pub fn push_slice(&mut self, values: &[T]) -> usize
    where
        T: Clone,
    {
        let free = self.free_slots(values.len());
        let count = values.len().min(free);
        unsafe { self.write_wrapped(&values[..count]) };
        count
    }

    /// Pushes clones of the whole slice, or nothing if it does not fit.
    pub fn try_push_slice(&mut self, values: &[T]) -> bool
    where
        T: Clone,
    {
        if self.free_slots(values.len()) < values.len() {
            return false;
        }
        unsafe { self.write_wrapped(values) };
        true
    }

    /// Moves elements out of the iterator into the queue until it is full
    /// or the iterator ends. Returns the number pushed; no element is
    /// pulled from the iterator without a slot waiting for it.
    pub fn push_iter<I: Iterator<Item = T>>(&mut self, mut iter: I) -> usize {
        let mut count = 0;
        loop {
            if self.free_slots(1) == 0 {
                return count;
            }
            match iter.next() {
                Some(value) => {
                    let tail = self.local_tail;
                    unsafe { self.buffer.add(tail).write(value) };
                    let next = next(tail, self.slots);
                    self.shared.tail.store(next, Ordering::Release);
                    self.local_tail = next;
                    count += 1;
                }
                None => return count,
            }
        }
    }

    /// Approximate number of queued elements.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.shared.tail.load(Ordering::SeqCst);
        let head = self.shared.head.load(Ordering::SeqCst);
        occupied_count(head, tail, self.slots)
    }

    /// True when no elements were visible at the time of the call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots - 1
    }

    /// Returns `true` if the consumer has been dropped.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        Arc::strong_count(&self.shared) == 1
    }

    /// Free slots, refreshing the cached head only when the cached view
    /// cannot satisfy `wanted`.
    #[inline]
    fn free_slots(&mut self, wanted: usize) -> usize {
        let mut free = free_count(self.local_tail, self.cached_head, self.slots);
        if free < wanted {
            self.cached_head = self.shared.head.load(Ordering::Acquire);
            free = free_count(self.local_tail, self.cached_head, self.slots);
        }
        free
    }

    /// Clones `values` into the ring starting at the local tail, then
    /// publishes. The ring may wrap, producing two contiguous segments.
    ///
    /// # Safety
    ///
    /// `values.len()` free slots must be available.
    unsafe fn write_wrapped(&mut self, values: &[T])
    where
        T: Clone,
    {
        if values.is_empty() {
            return;
        }
        let tail = self.local_tail;
        let first = values.len().min(self.slots - tail);
        unsafe {
            for (i, value) in values[..first].iter().enumerate() {
                self.buffer.add(tail + i).write(value.clone());
            }
            for (i, value) in values[first..].iter().enumerate() {
                self.buffer.add(i).write(value.clone());
            }
        }
        let tail = advance(tail, values.len(), self.slots);
        self.shared.tail.store(tail, Ordering::Release);
        self.local_tail = tail;
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// The consumer endpoint of an SPSC queue.
#[repr(C)]
pub struct Consumer<T> {
    local_head: usize,
    cached_tail: usize,
    buffer: *mut T,
    slots: usize,
    shared: Arc<Shared<T>>,
}

unsafe impl<T: Send> Send for Consumer<T> {}

impl<T> Consumer<T> {
    /// Pops a value from the queue.
    ///
    /// Returns `None` if the queue is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let head = self.local_head;

        if head == self.cached_tail {
            self.cached_tail = self.shared.tail.load(Ordering::Acquire);
            if head == self.cached_tail {
                return None;
            }
        }

        let value = unsafe { self.buffer.add(head).read() };
        let next = next(head, self.slots);
        self.shared.head.store(next, Ordering::Release);
        self.local_head = next;

        Some(value)
    }

    /// Pops up to `out.len()` elements, assigning them in order over the
    /// slice prefix. Returns the number popped.
    pub fn pop_slice(&mut self, out: &mut [T]) -> usize {
        let available = self.available_slots(out.len());
        let count = out.len().min(available);
        unsafe { self.read_wrapped(&mut out[..count]) };
        count
    }

    /// Pops exactly `out.len()` elements, or nothing if fewer are queued.
    pub fn try_pop_slice(&mut self, out: &mut [T]) -> bool {
        if self.available_slots(out.len()) < out.len() {
            return false;
        }
        unsafe { self.read_wrapped(out) };
        true
    }

    /// Drains the queue by repeated pop. Requires the producer side to be
    /// quiescent for an exact result.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    /// Approximate number of queued elements.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.shared.tail.load(Ordering::SeqCst);
        let head = self.shared.head.load(Ordering::SeqCst);
        occupied_count(head, tail, self.slots)
    }

    /// True when no elements were visible at the time of the call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots - 1
    }

    /// Returns `true` if the producer has been dropped.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        Arc::strong_count(&self.shared) == 1
    }

    /// Queued elements, refreshing the cached tail only when the cached
    /// view cannot satisfy `wanted`.
    #[inline]
    fn available_slots(&mut self, wanted: usize) -> usize {
        let mut available = occupied_count(self.local_head, self.cached_tail, self.slots);
        if available < wanted {
            self.cached_tail = self.shared.tail.load(Ordering::Acquire);
            available = occupied_count(self.local_head, self.cached_tail, self.slots);
        }
        available
    }

    /// Moves queued elements into `out`, then publishes. The ring may
    /// wrap, producing two contiguous segments.
    ///
    /// # Safety
    ///
    /// `out.len()` elements must be queued.
    unsafe fn read_wrapped(&mut self, out: &mut [T]) {
        if out.is_empty() {
            return;
        }
        let head = self.local_head;
        let first = out.len().min(self.slots - head);
        unsafe {
            for (i, slot) in out[..first].iter_mut().enumerate() {
                *slot = self.buffer.add(head + i).read();
            }
            let remainder = &mut out[first..];
            for (i, slot) in remainder.iter_mut().enumerate() {
                *slot = self.buffer.add(i).read();
            }
        }
        let head = advance(head, out.len(), self.slots);
        self.shared.head.store(head, Ordering::Release);
        self.local_head = head;
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
