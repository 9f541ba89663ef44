//! Coarse-grained concurrency structures: page-pool staging and per-value
//! locking.
//!
//! - [`PageQueue`]: multi-producer multi-consumer staging where each
//!   thread takes exclusive ownership of a whole page and fills or drains
//!   it linearly. Page handoff is a single CAS; the reader/writer lock
//!   guards only page-list growth.
//! - [`AccessTable`]: a keyed table where every entry carries its own
//!   mutex, so look-ups of disjoint keys never serialize on a value lock.
//!
//! # Quick Start
//!
//! ```
//! use lattice_sync::{AccessTable, PageQueue};
//!
//! let queue: PageQueue<u64> = PageQueue::new();
//! let mut page = queue.acquire_producer();
//! page.data_mut().extend([1, 2, 3]);
//! drop(page);
//!
//! let drained = queue.acquire_consumer().unwrap();
//! assert_eq!(drained.data().len(), 3);
//!
//! let table: AccessTable<&str, u64> = AccessTable::new();
//! table.insert("total", 40);
//! *table.find(&"total").unwrap() += 2;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

mod access_table;
mod page_queue;

pub use access_table::{AccessTable, ValueGuard};
pub use page_queue::{PageConsumer, PageProducer, PageQueue};
