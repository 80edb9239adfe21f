//! Higher-order adapters between blocking functions and callback-based
//! asynchronous functions.
//!
//! - [`to_async`] wraps a blocking function so that it runs on its own pool of
//!   worker threads and reports through a completion handler (and an error
//!   handler, if it is fallible) instead of returning.
//! - [`to_sync`], [`to_sync_with_error_handler`] and
//!   [`to_sync_with_optional_error`] wrap an asynchronous function, in one of
//!   three callback shapes, so that calling it blocks until it calls back.
//!
//! Inputs of up to four parameters are passed as a tuple; several outputs are
//! returned as a tuple. Completion callbacks may take up to four outputs
//! positionally, which the blocking side also returns as a tuple.

pub mod asyncify;
pub mod call;
pub mod errors;
pub mod executor;
pub mod mutex;
pub mod outcome;
pub mod rendezvous;
pub mod shape;
pub mod syncify;

pub use asyncify::{to_async, to_async_with, Asyncified};
pub use call::{AsyncFn, Callable};
pub use errors::Error;
pub use executor::{Configuration, Rejected, WorkerPool};
pub use rendezvous::Rendezvous;
pub use shape::{
    CallbackShape, Completion, CompletionHandler, ErrorHandler, FallibleCompletion,
    OptionalErrorHandler, ShapeKind,
};
pub use syncify::{to_sync, to_sync_with_error_handler, to_sync_with_optional_error, Syncified};
