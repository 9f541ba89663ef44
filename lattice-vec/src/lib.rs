//! Contiguous containers with configurable storage layout.
//!
//! `lattice-vec` provides one shared operation surface — push/pop, ranged
//! insert and erase, replace-style resize, exact reserve, find, sorted
//! overlay — over interchangeable storage backends:
//!
//! - [`Vector`]: the classic `(data, size, capacity)` triple in the
//!   container (24 bytes; 16 with a `u32` range via [`TinyVector`])
//! - [`FlatVector`]: size and capacity live in a header in front of the
//!   elements; the container itself is a single pointer
//! - [`SmallVector`]: `N` inline slots, spilling to the heap when exceeded
//! - `Allocated*`: any of the above with allocation delegated to a
//!   caller-supplied [`HookAllocator`]
//! - `Sorted*`: any of the above maintaining a sort invariant under a
//!   caller-supplied [`SortOrder`]
//!
//! # Quick Start
//!
//! ```
//! use lattice_vec::{FlatVector, SmallVector};
//!
//! let mut v: FlatVector<u32> = FlatVector::from(&[1, 2, 3][..]);
//! v.insert_slice(1, &[10, 11]);
//! assert_eq!(v, [1, 10, 11, 2, 3]);
//!
//! // Four inline slots: no allocation until the fifth push.
//! let mut s: SmallVector<u32, 4> = SmallVector::new();
//! s.push(7);
//! assert_eq!(s.capacity(), 4);
//! ```
//!
//! Containers are single-owner values: not for concurrent use, but `Send`
//! and `Sync` whenever `T` is.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

mod alloc;
mod flat;
mod heap_array;
mod inline;
mod range;
mod small;
mod sorted;
mod storage;
mod vector;

pub use alloc::{CACHE_LINE, Global, HookAllocator};
pub use flat::FlatStorage;
pub use heap_array::HeapArray;
pub use inline::InlineStorage;
pub use range::Range;
pub use small::SmallStorage;
pub use sorted::{NaturalOrder, SortOrder, SortedVector};
pub use storage::VecStorage;
pub use vector::Vector;

/// A [`Vector`] with 32-bit size and capacity fields (16 bytes).
pub type TinyVector<T> = Vector<T, InlineStorage<T, u32>>;

/// A pointer-sized vector: size and capacity live on the heap.
pub type FlatVector<T> = Vector<T, FlatStorage<T>>;

/// A [`FlatVector`] with 32-bit header fields.
pub type TinyFlatVector<T> = Vector<T, FlatStorage<T, u32>>;

/// A vector with `N` inline slots that spills to the heap when exceeded.
pub type SmallVector<T, const N: usize, R = usize, A = Global> =
    Vector<T, SmallStorage<T, N, R, A>>;

/// A [`SmallVector`] with 32-bit size and capacity fields.
pub type TinySmallVector<T, const N: usize> = Vector<T, SmallStorage<T, N, u32>>;

/// A [`Vector`] allocating through a caller-supplied hook.
pub type AllocatedVector<T, A> = Vector<T, InlineStorage<T, usize, A>>;

/// A [`FlatVector`] allocating through a caller-supplied hook.
pub type AllocatedFlatVector<T, A> = Vector<T, FlatStorage<T, usize, A>>;

/// A [`SmallVector`] whose heap spill goes through a caller-supplied hook.
pub type AllocatedSmallVector<T, const N: usize, A> = Vector<T, SmallStorage<T, N, usize, A>>;

/// A [`SortedVector`] with 32-bit size and capacity fields.
pub type SortedTinyVector<T, O = NaturalOrder> = SortedVector<T, InlineStorage<T, u32>, O>;

/// A sorted, pointer-sized vector.
pub type SortedFlatVector<T, O = NaturalOrder> = SortedVector<T, FlatStorage<T>, O>;

/// A sorted small-buffer vector.
pub type SortedSmallVector<T, const N: usize, O = NaturalOrder> =
    SortedVector<T, SmallStorage<T, N>, O>;

/// A sorted vector allocating through a caller-supplied hook.
pub type SortedAllocatedVector<T, A, O = NaturalOrder> =
    SortedVector<T, InlineStorage<T, usize, A>, O>;

/// A sorted flat vector allocating through a caller-supplied hook.
pub type SortedAllocatedFlatVector<T, A, O = NaturalOrder> =
    SortedVector<T, FlatStorage<T, usize, A>, O>;

/// A sorted small-buffer vector whose heap spill goes through a
/// caller-supplied hook.
pub type SortedAllocatedSmallVector<T, const N: usize, A, O = NaturalOrder> =
    SortedVector<T, SmallStorage<T, N, usize, A>, O>;
