//! Event dispatcher: a small-buffer vector of callback holders invoked in
//! registration order.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use lattice_vec::SmallVector;

use crate::callable::{Callable, MemberCallable, MemberCallableConst};
use crate::callback::Callback;
use crate::trivial::TrivialCallback;

/// A bound holder a dispatcher can invoke. Implemented by [`Callback`] and
/// [`TrivialCallback`].
pub trait Handler<A, R>: Default {
    /// Invokes the bound payload.
    fn handle(&mut self, args: A) -> R;
}

impl<A, R, const CACHE: usize> Handler<A, R> for Callback<A, R, CACHE> {
    #[inline]
    fn handle(&mut self, args: A) -> R {
        self.call(args)
    }
}

impl<A, R, const CACHE: usize> Handler<A, R> for TrivialCallback<A, R, CACHE> {
    #[inline]
    fn handle(&mut self, args: A) -> R {
        self.call(args)
    }
}

/// Fans one event call over every registered handler, in registration
/// order.
///
/// Four inline handler slots before the list spills to the heap. No error
/// recovery: a panicking handler skips the remainder and propagates.
///
/// # Example
///
/// ```
/// use lattice_dispatch::Dispatcher;
///
/// let mut events: Dispatcher<(u32,), u32> = Dispatcher::new();
/// events.add(|x: u32| x * 2);
/// events.add(|x: u32| x + 1);
///
/// let mut results = Vec::new();
/// events.dispatch_with(|r| results.push(r), (3,));
/// assert_eq!(results, [6, 4]);
/// ```
pub struct DispatcherDetails<A, R, H> {
    handlers: SmallVector<H, 4, u32>,
    _marker: PhantomData<fn(A) -> R>,
}

/// The common dispatcher: full [`Callback`] holders.
pub type Dispatcher<A, R = ()> = DispatcherDetails<A, R, Callback<A, R>>;

/// The hot-path dispatcher: [`TrivialCallback`] holders, so the whole
/// dispatcher is itself copy-friendly to store.
pub type TrivialDispatcher<A, R = ()> = DispatcherDetails<A, R, TrivialCallback<A, R>>;

impl<A, R, H: Handler<A, R>> DispatcherDetails<A, R, H> {
    /// Creates a dispatcher with no handlers.
    #[inline]
    pub fn new() -> Self {
        Self {
            handlers: SmallVector::new(),
            _marker: PhantomData,
        }
    }

    /// Number of registered handlers.
    #[inline]
    pub fn count(&self) -> usize {
        self.handlers.len()
    }

    /// Destroys every handler.
    #[inline]
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Invokes every handler in registration order, discarding results.
    pub fn dispatch(&mut self, args: A)
    where
        A: Clone,
    {
        for handler in self.handlers.iter_mut() {
            handler.handle(args.clone());
        }
    }

    /// Invokes every handler in registration order, feeding each result to
    /// `callback`.
    pub fn dispatch_with<C>(&mut self, mut callback: C, args: A)
    where
        A: Clone,
        C: FnMut(R),
    {
        for handler in self.handlers.iter_mut() {
            callback(handler.handle(args.clone()));
        }
    }
}

impl<A, R, const CACHE: usize> DispatcherDetails<A, R, Callback<A, R, CACHE>> {
    /// Registers any invocable value.
    pub fn add<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + 'static,
    {
        self.handlers.push(Callback::new()).prepare(f);
    }

    /// Registers a captureless function.
    pub fn add_free<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + Copy + 'static,
    {
        self.handlers.push(Callback::new()).prepare_free(f);
    }

    /// Registers a method against an instance pointer.
    ///
    /// # Safety
    ///
    /// `instance` must outlive the dispatcher and not be aliased mutably
    /// while events can be dispatched.
    pub unsafe fn add_member<T, M>(&mut self, instance: NonNull<T>, method: M)
    where
        M: MemberCallable<T, A, Output = R> + Copy + 'static,
    {
        unsafe {
            self.handlers
                .push(Callback::new())
                .prepare_member(instance, method);
        }
    }

    /// Registers a method taking a shared receiver.
    ///
    /// # Safety
    ///
    /// `instance` must outlive the dispatcher.
    pub unsafe fn add_member_const<T, M>(&mut self, instance: NonNull<T>, method: M)
    where
        M: MemberCallableConst<T, A, Output = R> + Copy + 'static,
    {
        unsafe {
            self.handlers
                .push(Callback::new())
                .prepare_member_const(instance, method);
        }
    }
}

impl<A, R, const CACHE: usize> DispatcherDetails<A, R, TrivialCallback<A, R, CACHE>> {
    /// Registers a trivially destructible invocable value.
    pub fn add<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + Copy + 'static,
    {
        self.handlers.push(TrivialCallback::new()).prepare(f);
    }

    /// Registers a captureless function.
    pub fn add_free<F>(&mut self, f: F)
    where
        F: Callable<A, Output = R> + Copy + 'static,
    {
        self.handlers.push(TrivialCallback::new()).prepare_free(f);
    }

    /// Registers a method against an instance pointer.
    ///
    /// # Safety
    ///
    /// `instance` must outlive the dispatcher and not be aliased mutably
    /// while events can be dispatched.
    pub unsafe fn add_member<T, M>(&mut self, instance: NonNull<T>, method: M)
    where
        M: MemberCallable<T, A, Output = R> + Copy + 'static,
    {
        unsafe {
            self.handlers
                .push(TrivialCallback::new())
                .prepare_member(instance, method);
        }
    }

    /// Registers a method taking a shared receiver.
    ///
    /// # Safety
    ///
    /// `instance` must outlive the dispatcher.
    pub unsafe fn add_member_const<T, M>(&mut self, instance: NonNull<T>, method: M)
    where
        M: MemberCallableConst<T, A, Output = R> + Copy + 'static,
    {
        unsafe {
            self.handlers
                .push(TrivialCallback::new())
                .prepare_member_const(instance, method);
        }
    }
}

impl<A, R, H: Handler<A, R>> Default for DispatcherDetails<A, R, H> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, H> fmt::Debug for DispatcherDetails<A, R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("count", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
