//! The full opaque callback holder.
//!
//! Representation: two thunk pointers plus an inline byte cache.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ invoke:  unsafe fn(cache, args) -> R     (None = unbound)│
//! │ destroy: unsafe fn(cache, release)  (None = no payload   │
//! │                                      destruction needed) │
//! │ cache:   [u8; CACHE]  — payload bits, or a heap slot     │
//! │          (ptr, size, capacity) for oversized/non-trivial │
//! │          payloads                                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Trivially destructible payloads that fit the cache are stored inline;
//! everything else lives in a cacheline-aligned heap block whose size is
//! recorded so a later rebinding can reuse it.

use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};
use std::alloc::{self, Layout, handle_alloc_error};

use crate::callable::{Callable, MemberCallable, MemberCallableConst};

/// Alignment of the holder and its inline cache (a quarter cache line).
pub const CALLBACK_ALIGN: usize = 16;

/// Heap payload blocks share one alignment so deallocation needs only the
/// recorded size.
const PAYLOAD_ALIGN: usize = 64;

#[repr(align(16))]
#[derive(Clone, Copy)]
pub(crate) struct Cache<const N: usize>(pub(crate) [MaybeUninit<u8>; N]);

impl<const N: usize> Cache<N> {
    #[inline]
    pub(crate) fn uninit() -> Self {
        Cache([MaybeUninit::uninit(); N])
    }
}

/// Descriptor of a heap-resident payload, stored at the front of the cache.
/// `capacity` records the block size for reuse on rebinding; zero marks a
/// caller-owned block that must never be reused or freed by the holder.
#[derive(Clone, Copy)]
#[repr(C)]
struct HeapSlot {
    ptr: *mut u8,
    size: usize,
    capacity: usize,
}

/// Payload of a deleter binding: the slot plus the caller's deleter.
#[repr(C)]
struct DeleterSlot<D> {
    slot: HeapSlot,
    deleter: D,
}

/// A type-erased holder for anything invocable with the argument tuple `A`.
///
/// Binds closures, function items, methods (via [`prepare_member`]), and
/// caller-owned heap payloads (via [`prepare_with_deleter`]). Payloads that
/// are trivially destructible and fit in `CACHE` bytes are stored inline;
/// others are heap-allocated, and rebinding reuses the block when the new
/// payload fits.
///
/// The holder is move-only and deliberately `!Send`: the payload type is
/// erased, so its thread affinity cannot be tracked.
///
/// [`prepare_member`]: Callback::prepare_member
/// [`prepare_with_deleter`]: Callback::prepare_with_deleter
///
/// # Example
///
/// ```
/// use lattice_dispatch::Callback;
///
/// let mut cb: Callback<(u32,), u32> = Callback::new();
/// cb.prepare(|x: u32| x * 2);
/// assert_eq!(cb.call((21,)), 42);
/// ```
pub struct Callback<A, R = (), const CACHE: usize = 48> {
    invoke: Option<unsafe fn(*mut u8, A) -> R>,
    destroy: Option<unsafe fn(*mut u8, bool)>,
    cache: Cache<CACHE>,
    _marker: PhantomData<*mut fn(A) -> R>,
}

impl<A, R, const CACHE: usize> Callback<A, R, CACHE> {
    /// The cache must hold at least a heap slot descriptor.
    const CACHE_HOLDS_SLOT: () = assert!(
        CACHE >= mem::size_of::<HeapSlot>(),
        "callback cache too small for the heap slot descriptor"
    );

    /// Creates an unbound callback.
    #[inline]
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CACHE_HOLDS_SLOT;
        Self {
            invoke: None,
            destroy: None,
            cache: Cache::uninit(),
            _marker: PhantomData,
        }
    }

    /// True once a payload is bound.
    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.invoke.is_some()
    }

    /// Invokes the bound payload.
    ///
    /// # Panics
    ///
    /// Panics if the callback is unbound.
    #[inline]
    pub fn call(&mut self, args: A) -> R {
        let invoke = self.invoke.expect("callback invoked while unbound");
        // Safety: the thunk was installed together with a matching payload.
        unsafe { invoke(self.cache_ptr(), args) }
    }

    /// Binds any invocable value, replacing the previous payload.
    pub fn prepare<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + 'static,
    {
        if Self::fits_inline::<F>() {
            self.release_payload();
            // Safety: size, alignment and triviality checked by fits_inline.
            unsafe { self.cache_ptr().cast::<F>().write(f) };
            self.invoke = Some(invoke_inline::<F, A, R>);
            self.destroy = None;
        } else {
            self.prepare_heap(f);
        }
    }

    /// Binds a captureless function; nothing but the thunk is stored.
    #[inline]
    pub fn prepare_free<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + Copy + 'static,
    {
        self.prepare(f);
    }

    /// Binds a method against an instance pointer. Only the pointer lands
    /// in the cache; no payload destruction is needed.
    ///
    /// # Safety
    ///
    /// `instance` must outlive the binding and not be aliased mutably while
    /// the callback can be invoked.
    pub unsafe fn prepare_member<T, M>(&mut self, instance: NonNull<T>, method: M)
    where
        M: MemberCallable<T, A, Output = R> + Copy + 'static,
    {
        self.release_payload();
        Self::assert_member_payload::<(NonNull<T>, M)>();
        unsafe {
            self.cache_ptr()
                .cast::<(NonNull<T>, M)>()
                .write((instance, method));
        }
        self.invoke = Some(invoke_member::<T, M, A, R>);
        self.destroy = None;
    }

    /// Binds a method taking a shared receiver.
    ///
    /// # Safety
    ///
    /// `instance` must outlive the binding.
    pub unsafe fn prepare_member_const<T, M>(&mut self, instance: NonNull<T>, method: M)
    where
        M: MemberCallableConst<T, A, Output = R> + Copy + 'static,
    {
        self.release_payload();
        Self::assert_member_payload::<(NonNull<T>, M)>();
        unsafe {
            self.cache_ptr()
                .cast::<(NonNull<T>, M)>()
                .write((instance, method));
        }
        self.invoke = Some(invoke_member_const::<T, M, A, R>);
        self.destroy = None;
    }

    /// Binds a caller-allocated payload with a custom deleter.
    ///
    /// The block is never reused for later rebindings; the deleter is
    /// responsible for destroying the payload and releasing its storage.
    ///
    /// # Safety
    ///
    /// `payload` must stay valid until the deleter runs, and the deleter
    /// must accept exactly this pointer.
    pub unsafe fn prepare_with_deleter<P, D>(&mut self, payload: NonNull<P>, deleter: D)
    where
        P: Callable<A, Output = R> + 'static,
        D: Fn(NonNull<P>) + Copy + 'static,
    {
        self.release_payload();
        Self::assert_member_payload::<DeleterSlot<D>>();
        let slot = HeapSlot {
            ptr: payload.as_ptr().cast(),
            size: mem::size_of::<P>(),
            capacity: 0,
        };
        unsafe {
            self.cache_ptr()
                .cast::<DeleterSlot<D>>()
                .write(DeleterSlot { slot, deleter });
        }
        self.invoke = Some(invoke_heap::<P, A, R>);
        self.destroy = Some(destroy_deleter::<P, D>);
    }

    /// Takes the binding out, leaving this holder unbound. The returned
    /// holder owns the payload — the move-and-null idiom.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Unbinds and destroys the payload.
    #[inline]
    pub fn release(&mut self) {
        self.release_payload();
    }

    #[inline]
    fn cache_ptr(&mut self) -> *mut u8 {
        self.cache.0.as_mut_ptr().cast()
    }

    const fn fits_inline<F>() -> bool {
        mem::size_of::<F>() <= CACHE
            && mem::align_of::<F>() <= CALLBACK_ALIGN
            && !mem::needs_drop::<F>()
    }

    fn assert_member_payload<P>() {
        assert!(
            mem::size_of::<P>() <= CACHE && mem::align_of::<P>() <= CALLBACK_ALIGN,
            "binding payload exceeds the callback cache"
        );
        debug_assert!(!mem::needs_drop::<P>());
    }

    /// Destroys the current payload (releasing any owned block) and clears
    /// both thunks.
    fn release_payload(&mut self) {
        if let Some(destroy) = self.destroy.take() {
            // Safety: destroy matches the payload currently in the cache.
            unsafe { destroy(self.cache_ptr(), true) };
        }
        self.invoke = None;
    }

    /// Heap-bind path: reuse the current block when the payload fits its
    /// recorded capacity, otherwise free it and allocate fresh.
    fn prepare_heap<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + 'static,
    {
        assert!(
            mem::align_of::<F>() <= PAYLOAD_ALIGN,
            "payload alignment exceeds the heap block alignment"
        );
        let size = mem::size_of::<F>().max(1);

        let slot = match self.destroy.take() {
            Some(destroy) => {
                // Safety: a non-null destroy implies the cache starts with
                // a HeapSlot describing the current payload.
                let old = unsafe { *self.cache_ptr().cast::<HeapSlot>() };
                if size <= old.capacity {
                    unsafe { destroy(self.cache_ptr(), false) };
                    HeapSlot {
                        ptr: old.ptr,
                        size,
                        capacity: old.capacity,
                    }
                } else {
                    unsafe { destroy(self.cache_ptr(), true) };
                    Self::allocate_block(size)
                }
            }
            None => Self::allocate_block(size),
        };
        self.invoke = None;

        // Safety: the block holds at least `size` bytes at PAYLOAD_ALIGN.
        unsafe {
            slot.ptr.cast::<F>().write(f);
            self.cache_ptr().cast::<HeapSlot>().write(slot);
        }
        self.invoke = Some(invoke_heap::<F, A, R>);
        self.destroy = Some(destroy_heap::<F>);
    }

    fn allocate_block(size: usize) -> HeapSlot {
        let layout = Layout::from_size_align(size, PAYLOAD_ALIGN).expect("payload too large");
        let ptr = unsafe { alloc::alloc(layout) };
        if ptr.is_null() {
            handle_alloc_error(layout);
        }
        HeapSlot {
            ptr,
            size,
            capacity: size,
        }
    }
}

unsafe fn invoke_inline<F, A, R>(cache: *mut u8, args: A) -> R
where
    F: Callable<A, Output = R>,
{
    // Safety: the cache holds a live F when this thunk is installed.
    unsafe { (*cache.cast::<F>()).invoke(args) }
}

unsafe fn invoke_heap<F, A, R>(cache: *mut u8, args: A) -> R
where
    F: Callable<A, Output = R>,
{
    // Safety: the cache starts with a HeapSlot pointing at a live F.
    unsafe {
        let slot = *cache.cast::<HeapSlot>();
        (*slot.ptr.cast::<F>()).invoke(args)
    }
}

unsafe fn invoke_member<T, M, A, R>(cache: *mut u8, args: A) -> R
where
    M: MemberCallable<T, A, Output = R>,
{
    // Safety: the cache holds (instance, method); the caller of
    // prepare_member vouched for the instance's lifetime.
    unsafe {
        let (instance, method) = &mut *cache.cast::<(NonNull<T>, M)>();
        method.invoke_member(instance.as_mut(), args)
    }
}

unsafe fn invoke_member_const<T, M, A, R>(cache: *mut u8, args: A) -> R
where
    M: MemberCallableConst<T, A, Output = R>,
{
    unsafe {
        let (instance, method) = &mut *cache.cast::<(NonNull<T>, M)>();
        method.invoke_member(instance.as_ref(), args)
    }
}

unsafe fn destroy_heap<F>(cache: *mut u8, release: bool) {
    // Safety: the cache starts with a HeapSlot whose block holds a live F.
    unsafe {
        let slot = *cache.cast::<HeapSlot>();
        ptr::drop_in_place(slot.ptr.cast::<F>());
        if release {
            let layout = Layout::from_size_align_unchecked(slot.capacity, PAYLOAD_ALIGN);
            alloc::dealloc(slot.ptr, layout);
        }
    }
}

unsafe fn destroy_deleter<P, D: Fn(NonNull<P>) + Copy>(cache: *mut u8, _release: bool) {
    // Deleter blocks record capacity 0, so rebinding never keeps them:
    // the deleter always runs exactly once.
    unsafe {
        let ds = &*cache.cast::<DeleterSlot<D>>();
        let payload = NonNull::new_unchecked(ds.slot.ptr.cast::<P>());
        (ds.deleter)(payload);
    }
}

impl<A, R, const CACHE: usize> Default for Callback<A, R, CACHE> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, const CACHE: usize> Drop for Callback<A, R, CACHE> {
    fn drop(&mut self) {
        self.release_payload();
    }
}

impl<A, R, const CACHE: usize> fmt::Debug for Callback<A, R, CACHE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("prepared", &self.is_prepared())
            .field("heap_payload", &self.destroy.is_some())
            .finish_non_exhaustive()
    }
}
