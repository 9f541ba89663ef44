//! Storage backend trait for the vector family.
//!
//! A backend decides *where* the `(data, size, capacity)` triple lives:
//! in the container itself ([`InlineStorage`](crate::InlineStorage)), in a
//! heap header next to the elements ([`FlatStorage`](crate::FlatStorage)),
//! or in an inline small buffer that spills to the heap
//! ([`SmallStorage`](crate::SmallStorage)). The shared algebra in
//! [`Vector`](crate::Vector) is written once against this trait.

use crate::Range;

/// Low-level storage contract implemented by every backend.
///
/// The trait exposes raw accessors and mutators; all element lifetime
/// management (construction, destruction, moves) is the caller's job.
///
/// # Safety
///
/// Implementations must guarantee:
/// - `as_ptr`/`as_mut_ptr` address at least `capacity()` contiguous,
///   properly aligned `T` slots whenever `capacity() > 0`;
/// - `len()` and `capacity()` reflect exactly what was last installed;
/// - `allocate` returns a buffer of the requested capacity, disjoint from
///   the current one, and `deallocate` accepts any `(data, capacity)` pair
///   previously produced by `allocate`/`install` on the same instance.
///
/// Callers drive the methods in a strict discipline: derive a data pointer,
/// perform all raw element operations through it, and only then call a
/// `&mut self` method again (a backend may hand out pointers into its own
/// inline buffer, which a later reborrow invalidates).
pub unsafe trait VecStorage<T>: Default {
    /// Integer type backing the size/capacity fields.
    type Range: Range;

    /// Pointer to the first element slot; null (or dangling) when empty.
    fn as_ptr(&self) -> *const T;

    /// Mutable pointer to the first element slot.
    fn as_mut_ptr(&mut self) -> *mut T;

    /// Number of live elements.
    fn len(&self) -> usize;

    /// Number of slots available without reallocation.
    fn capacity(&self) -> usize;

    /// Sets the live element count.
    ///
    /// # Safety
    ///
    /// `len <= capacity()`, and the first `len` slots must hold initialized
    /// values once control returns to safe code.
    unsafe fn set_len(&mut self, len: usize);

    /// Allocates a detached buffer of `capacity` slots.
    ///
    /// The current buffer and fields are untouched; the caller moves
    /// elements over and hands the result to [`install`](Self::install).
    ///
    /// # Safety
    ///
    /// `capacity` must be non-zero and representable in `Self::Range`.
    unsafe fn allocate(&mut self, capacity: usize) -> *mut T;

    /// Releases a buffer of `capacity` slots.
    ///
    /// # Safety
    ///
    /// The pair must originate from this instance's `allocate`/`install`
    /// history and contain no live elements.
    unsafe fn deallocate(&mut self, data: *mut T, capacity: usize);

    /// Adopts `data` as the current buffer with the given size and capacity.
    ///
    /// # Safety
    ///
    /// `data` must come from [`allocate`](Self::allocate) with `capacity`
    /// slots (or be null with `len == 0 && capacity == 0`), and its first
    /// `len` slots must be initialized.
    unsafe fn install(&mut self, data: *mut T, len: usize, capacity: usize);

    /// Returns to the backend's default empty state without releasing
    /// anything. Used after the buffer has been deallocated.
    fn reset(&mut self);
}
