//! Turning callback-based asynchronous functions into blocking ones.
//!
//! Each call of a [`Syncified`] function creates its own [`Rendezvous`] and
//! [`OutcomeSlot`], enters the rendezvous, invokes the asynchronous function
//! with callbacks that fill the slot and leave, applies the starter to the
//! returned handle and blocks until the rendezvous is released.
//!
//! The calling thread really blocks. If the asynchronous function never fires
//! any of its callbacks, the call never returns. If it fires more than one,
//! whichever outcome was stored last before the caller woke up is returned.
//!
//! Completion callbacks may take up to four outputs positionally; see
//! [`Completion`] for how they come back.

use core::fmt;
use core::marker::PhantomData;

extern crate alloc;
use alloc::sync::Arc;

use crate::call::AsyncFn;
use crate::outcome::{Notifier, OutcomeSlot};
use crate::rendezvous::Rendezvous;
use crate::shape::{
    CallbackShape, Completion, DualHandler, ErrorHandler, FallibleCompletion, NoError, ShapeKind,
    TrailingError,
};

/// Bridges an asynchronous function reporting through a single completion handler.
///
/// ```
/// use std::thread;
///
/// use sync_async::{to_sync, CompletionHandler};
///
/// fn double_later(n: i32, done: CompletionHandler<i32>) {
///     thread::spawn(move || done(n * 2));
/// }
///
/// assert_eq!(to_sync(double_later).call((10,)), 20);
/// ```
pub fn to_sync<F, A, H, R>(f: F) -> Syncified<F, A, NoError<H>, fn(R)>
where
    F: AsyncFn<A, (H,), Handle = R>,
    H: Completion,
{
    Syncified::new(f)
}

/// Bridges an asynchronous function reporting through separate completion and
/// error handlers. The bridged call returns `Err` with the error exactly as
/// delivered, whatever its type.
pub fn to_sync_with_error_handler<F, A, H, E, R>(
    f: F,
) -> Syncified<F, A, DualHandler<H, E>, fn(R)>
where
    F: AsyncFn<A, (H, ErrorHandler<E>), Handle = R>,
    H: Completion,
    E: Send + 'static,
{
    Syncified::new(f)
}

/// Bridges an asynchronous function whose single completion handler takes an
/// optional error as its last argument.
///
/// ```
/// use std::thread;
///
/// use sync_async::{to_sync_with_optional_error, OptionalErrorHandler};
///
/// #[derive(Debug, PartialEq)]
/// enum Error {
///     CannotDivideOddByTwo,
/// }
///
/// fn half(n: i32, done: OptionalErrorHandler<i32, Error>) {
///     thread::spawn(move || {
///         if n % 2 == 0 {
///             done(n / 2, None)
///         } else {
///             done(0, Some(Error::CannotDivideOddByTwo))
///         }
///     });
/// }
///
/// let half = to_sync_with_optional_error(half);
///
/// assert_eq!(half.call((4,)), Ok(2));
/// assert_eq!(half.call((3,)), Err(Error::CannotDivideOddByTwo));
/// ```
pub fn to_sync_with_optional_error<F, A, H, R>(
    f: F,
) -> Syncified<F, A, TrailingError<H>, fn(R)>
where
    F: AsyncFn<A, (H,), Handle = R>,
    H: FallibleCompletion,
{
    Syncified::new(f)
}

fn discard<R>(_handle: R) {}

/// A blocking version of the asynchronous function `F`, taking the inputs `A`.
///
/// `S` is the callback shape of `F` and `St` the starter applied to whatever
/// `F` returns, for functions that do not begin working until told to.
pub struct Syncified<F, A, S, St> {
    f: F,
    start: St,
    _shape: PhantomData<fn(A) -> S>,
}

impl<F, A, S, R> Syncified<F, A, S, fn(R)>
where
    S: CallbackShape,
    F: AsyncFn<A, S::Handlers, Handle = R>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            start: discard,
            _shape: PhantomData,
        }
    }
}

impl<F, A, S, St> Syncified<F, A, S, St>
where
    S: CallbackShape,
{
    /// The callback convention the bridged function follows.
    pub fn kind(&self) -> ShapeKind {
        S::KIND
    }

    /// Replaces the starter with `start`, which receives the value returned by
    /// every invocation of the asynchronous function and has to set it going.
    ///
    /// Without a starter that activates it, a function which does not start on
    /// its own never calls back, and the bridged call never returns.
    pub fn with_starter<R, T>(self, start: T) -> Syncified<F, A, S, T>
    where
        F: AsyncFn<A, S::Handlers, Handle = R>,
        T: Fn(R),
    {
        Syncified {
            f: self.f,
            start,
            _shape: PhantomData,
        }
    }

    /// Invokes the asynchronous function with `args` and blocks until it calls back.
    pub fn call<R>(&self, args: A) -> S::Output
    where
        F: AsyncFn<A, S::Handlers, Handle = R>,
        St: Fn(R),
    {
        log::trace!("Bridging call with {:?} callbacks", S::KIND);

        let exchange = Arc::new((OutcomeSlot::new(), Rendezvous::new()));
        let (slot, rendezvous) = &*exchange;

        rendezvous.enter();

        let handle = self
            .f
            .invoke(args, S::handlers(Notifier::new(exchange.clone())));

        (self.start)(handle);

        rendezvous.wait();

        match slot.take() {
            Some(payload) => S::resolve(payload),
            None => unreachable!("Rendezvous released without an outcome"),
        }
    }

    /// Turns the bridge into a plain closure over the packed inputs.
    pub fn into_fn<R>(self) -> impl Fn(A) -> S::Output
    where
        F: AsyncFn<A, S::Handlers, Handle = R>,
        St: Fn(R),
    {
        move |args| self.call(args)
    }
}

impl<F, A, S, St> fmt::Debug for Syncified<F, A, S, St>
where
    S: CallbackShape,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Syncified")
            .field("shape", &S::KIND)
            .finish()
    }
}
