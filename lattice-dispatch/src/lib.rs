//! Opaque callback holders and an event dispatcher.
//!
//! [`Callback`] erases any invocable value behind two thunk pointers and an
//! inline byte cache: small trivially destructible payloads are stored
//! inline, larger or non-trivial ones escape to a reusable heap block.
//! [`TrivialCallback`] is the hot-path variant — inline-only, `Copy`, safe
//! to store by value in containers and queues. [`Dispatcher`] fans an event
//! call over a small vector of holders in registration order.
//!
//! Signatures are expressed as an argument tuple plus a return type;
//! [`Callable`] bridges that encoding to ordinary closures and functions.
//!
//! # Quick Start
//!
//! ```
//! use lattice_dispatch::{Callback, Dispatcher};
//!
//! let mut cb: Callback<(u32, u32), u32> = Callback::new();
//! cb.prepare(|a: u32, b: u32| a + b);
//! assert_eq!(cb.call((20, 22)), 42);
//!
//! let mut events: Dispatcher<(u32,)> = Dispatcher::new();
//! events.add(|x: u32| println!("got {x}"));
//! events.dispatch((7,));
//! ```
//!
//! Holders and dispatchers are single-threaded values: the payload type is
//! erased, so they are deliberately `!Send`.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

mod callable;
mod callback;
mod dispatcher;
mod trivial;

pub use callable::{Callable, MemberCallable, MemberCallableConst};
pub use callback::{CALLBACK_ALIGN, Callback};
pub use dispatcher::{Dispatcher, DispatcherDetails, Handler, TrivialDispatcher};
pub use trivial::TrivialCallback;
