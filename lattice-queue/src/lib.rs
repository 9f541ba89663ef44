//! Bounded lock-free queues for latency-critical pipelines.
//!
//! Two rings with different concurrency contracts:
//!
//! - [`spsc`]: exactly one producer thread and one consumer thread. Each
//!   side privately caches the opposite index, so the fast path never
//!   touches the other side's cache line. Supports ranged push/pop.
//! - [`MpmcQueue`]: any number of producers and consumers, coordinated by
//!   per-cell sequence numbers (power-of-two capacity).
//!
//! # Quick Start
//!
//! ```
//! use lattice_queue::{MpmcQueue, spsc};
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(8);
//! tx.push(42).unwrap();
//! assert_eq!(rx.pop(), Some(42));
//!
//! let q = MpmcQueue::<u64>::new(16);
//! q.push(7).unwrap();
//! assert_eq!(q.pop(), Some(7));
//! ```
//!
//! Queue-full and queue-empty are normal signals reported by value, never
//! errors; precondition violations (zero capacity, non-power-of-two MPMC
//! capacity) fail construction loudly.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

use core::fmt;

pub mod mpmc;
pub mod spsc;

pub use mpmc::MpmcQueue;

/// Error returned when pushing to a full queue.
///
/// Contains the value that could not be pushed, returning ownership to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be pushed.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}
