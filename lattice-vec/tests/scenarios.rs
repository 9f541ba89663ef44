//! End-to-end scenarios exercising every backend through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};

use lattice_vec::{
    AllocatedSmallVector, AllocatedVector, FlatVector, HookAllocator, SmallVector, SortedVector,
    TinyVector, Vector,
};

// ============================================================================
// FlatVector round trip
// ============================================================================

#[test]
fn flat_vector_round_trip() {
    let mut v: FlatVector<i32> = FlatVector::from(&[1, 2, 3, 4, 5][..]);
    assert_eq!(v.len(), 5);
    assert!(v.capacity() >= 5);
    assert_eq!(v, [1, 2, 3, 4, 5]);

    v.insert_slice(2, &[99, 100]);
    assert_eq!(v, [1, 2, 99, 100, 3, 4, 5]);

    v.erase(3..5);
    assert_eq!(v, [1, 2, 99, 4, 5]);
}

#[test]
fn flat_vector_is_pointer_sized() {
    assert_eq!(
        std::mem::size_of::<FlatVector<u64>>(),
        std::mem::size_of::<usize>()
    );
}

// ============================================================================
// SmallVector spill behavior
// ============================================================================

#[test]
fn small_vector_spills_to_heap() {
    let mut v: SmallVector<i32, 4> = SmallVector::new();
    for i in 0..4 {
        v.push(i);
    }
    assert!(v.is_inline());
    assert_eq!(v, [0, 1, 2, 3]);

    v.push(4);
    assert!(!v.is_inline());
    assert_eq!(v, [0, 1, 2, 3, 4]);

    v.pop();
    v.pop();
    assert_eq!(v, [0, 1, 2]);
    // No shrink back to the inline buffer.
    assert!(!v.is_inline());
}

#[test]
fn small_vector_reserve_within_inline_capacity_is_free() {
    let mut v: SmallVector<u64, 8> = SmallVector::new();
    for n in 0..=8 {
        assert!(!v.reserve(n));
    }
    assert!(v.is_inline());
}

// ============================================================================
// Allocator hook
// ============================================================================

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static DEALLOCATED: AtomicUsize = AtomicUsize::new(0);

/// A hook that counts calls and forwards to the global allocator.
struct CountingAlloc;

unsafe impl HookAllocator for CountingAlloc {
    unsafe fn allocate(size: usize, align: usize) -> *mut u8 {
        ALLOCATED.fetch_add(1, Ordering::SeqCst);
        unsafe { lattice_vec::Global::allocate(size, align) }
    }

    unsafe fn deallocate(ptr: *mut u8, size: usize, align: usize) {
        DEALLOCATED.fetch_add(1, Ordering::SeqCst);
        unsafe { lattice_vec::Global::deallocate(ptr, size, align) }
    }
}

#[test]
fn hook_allocations_are_balanced() {
    ALLOCATED.store(0, Ordering::SeqCst);
    DEALLOCATED.store(0, Ordering::SeqCst);
    {
        let mut v: AllocatedVector<u64, CountingAlloc> = AllocatedVector::new();
        for i in 0..100 {
            v.push(i);
        }
        assert_eq!(v.len(), 100);
    }
    let allocated = ALLOCATED.load(Ordering::SeqCst);
    assert!(allocated > 0);
    assert_eq!(allocated, DEALLOCATED.load(Ordering::SeqCst));
}

#[test]
fn small_backend_never_hooks_while_inline() {
    static SMALL_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    struct SmallCounting;
    unsafe impl HookAllocator for SmallCounting {
        unsafe fn allocate(size: usize, align: usize) -> *mut u8 {
            SMALL_ALLOCATED.fetch_add(1, Ordering::SeqCst);
            unsafe { lattice_vec::Global::allocate(size, align) }
        }
        unsafe fn deallocate(ptr: *mut u8, size: usize, align: usize) {
            unsafe { lattice_vec::Global::deallocate(ptr, size, align) }
        }
    }

    let mut v: AllocatedSmallVector<u64, 8, SmallCounting> = AllocatedSmallVector::new();
    for i in 0..8 {
        v.push(i);
        v.reserve(i as usize + 1);
    }
    assert_eq!(SMALL_ALLOCATED.load(Ordering::SeqCst), 0);

    v.push(8);
    assert_eq!(SMALL_ALLOCATED.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Universal invariants across backends
// ============================================================================

fn exercise<S: lattice_vec::VecStorage<u32>>() {
    let mut v: Vector<u32, S> = Vector::new();

    // Size never exceeds capacity through a mixed operation sequence.
    for i in 0..50 {
        v.push(i);
        assert!(v.len() <= v.capacity());
    }
    v.erase(10..30);
    assert!(v.len() <= v.capacity());
    v.insert_copies(5, 7, &99);
    assert!(v.len() <= v.capacity());

    // resize(r, x) equals a freshly constructed container of r copies.
    v.resize(6, &3);
    let mut fresh: Vector<u32, S> = Vector::new();
    fresh.resize(6, &3);
    assert_eq!(v, fresh);

    // Reserve guarantees pushes without reallocation.
    assert!(v.reserve(100));
    let cap = v.capacity();
    for i in v.len()..100 {
        v.push(i as u32);
    }
    assert_eq!(v.capacity(), cap);

    v.clear();
    assert_eq!(v.len(), 0);
    assert_eq!(v.iter().count(), 0);
}

#[test]
fn invariants_hold_for_every_backend() {
    exercise::<lattice_vec::InlineStorage<u32>>();
    exercise::<lattice_vec::InlineStorage<u32, u32>>();
    exercise::<lattice_vec::FlatStorage<u32>>();
    exercise::<lattice_vec::FlatStorage<u32, u32>>();
    exercise::<lattice_vec::SmallStorage<u32, 4>>();
    exercise::<lattice_vec::SmallStorage<u32, 64>>();
}

// ============================================================================
// Sorted overlay over non-default backends
// ============================================================================

#[test]
fn sorted_overlay_invariant_after_every_mutator() {
    let mut v: SortedVector<u32, lattice_vec::FlatStorage<u32>> = SortedVector::new();
    v.insert_slice(&[9, 1, 7, 3]);
    assert!(v.windows(2).all(|w| w[0] <= w[1]));

    v.push(5);
    assert!(v.windows(2).all(|w| w[0] <= w[1]));

    v.assign(0, 100);
    assert!(v.windows(2).all(|w| w[0] <= w[1]));

    v.erase(1..2);
    assert!(v.windows(2).all(|w| w[0] <= w[1]));
}

// ============================================================================
// Mixed-width ranges
// ============================================================================

#[test]
fn tiny_vector_footprint_and_behavior() {
    assert_eq!(std::mem::size_of::<TinyVector<u64>>(), 16);

    let mut v: TinyVector<u64> = TinyVector::new();
    for i in 0..1000 {
        v.push(i);
    }
    assert_eq!(v.len(), 1000);
    assert_eq!(v[999], 999);
}
