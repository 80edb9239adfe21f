//! Turning blocking functions into functions which report through callbacks.

use core::fmt;
use core::marker::PhantomData;

extern crate alloc;
use alloc::sync::Arc;

use crate::call::{AsyncFn, Callable};
use crate::errors::Error;
use crate::executor::{Configuration, WorkerPool};
use crate::shape::{CompletionHandler, ErrorHandler};

/// Wraps `f` so that it runs on a dedicated pool of worker threads and hands
/// its result to a completion handler instead of returning it.
///
/// A call whose function panics reports nothing: the panic is logged on the
/// worker thread and neither handler is invoked, so a blocking bridge over it
/// waits forever. If no worker thread can be started at all, the call runs on
/// the calling thread instead.
///
/// ```
/// use sync_async::to_async;
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// let (tx, rx) = std::sync::mpsc::channel();
///
/// to_async(add).call((2, 3), move |sum| tx.send(sum).unwrap());
///
/// assert_eq!(rx.recv().unwrap(), 5);
/// ```
pub fn to_async<F, A>(f: F) -> Asyncified<F, A>
where
    F: Callable<A> + Send + Sync + 'static,
{
    Asyncified::new(f, WorkerPool::default())
}

/// Same as [`to_async`], with the worker threads configured by `conf`.
pub fn to_async_with<F, A>(f: F, conf: &Configuration) -> Result<Asyncified<F, A>, Error>
where
    F: Callable<A> + Send + Sync + 'static,
{
    Ok(Asyncified::new(f, WorkerPool::new(conf)?))
}

/// A blocking function of the inputs `A`, callable in a non-blocking,
/// callback-based way.
///
/// Every call returns right away; the function runs on one of the wrapper's own
/// worker threads, and the callbacks are invoked from there. Calls made at the
/// same time run side by side and may complete in any order.
pub struct Asyncified<F, A> {
    f: Arc<F>,
    pool: WorkerPool,
    _args: PhantomData<fn(A)>,
}

impl<F, A> Asyncified<F, A>
where
    F: Callable<A> + Send + Sync + 'static,
{
    pub fn new(f: F, pool: WorkerPool) -> Self {
        Self {
            f: Arc::new(f),
            pool,
            _args: PhantomData,
        }
    }

    /// Runs the function with `args` and hands its return value to `completion`.
    pub fn call<C>(&self, args: A, completion: C)
    where
        A: Send + 'static,
        C: FnOnce(F::Output) + Send + 'static,
    {
        let f = self.f.clone();

        self.execute(move || completion(f.call_with(args)));
    }

    /// Runs the fallible function with `args`, handing a success value to
    /// `completion` or the error to `on_error`. Exactly one of them is called.
    pub fn try_call<T, E, C, H>(&self, args: A, completion: C, on_error: H)
    where
        F: Callable<A, Output = Result<T, E>>,
        A: Send + 'static,
        C: FnOnce(T) + Send + 'static,
        H: FnOnce(E) + Send + 'static,
    {
        let f = self.f.clone();

        self.execute(move || match f.call_with(args) {
            Ok(output) => completion(output),
            Err(error) => on_error(error),
        });
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    fn execute(&self, job: impl FnOnce() + Send + 'static) {
        if let Err(rejected) = self.pool.execute(job) {
            log::warn!("{}, running on the calling thread", rejected);

            rejected.run();
        }
    }
}

impl<F, A> fmt::Debug for Asyncified<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asyncified")
            .field("pool", &self.pool)
            .finish()
    }
}

// An `Asyncified` is itself an asynchronous function, in either callback
// shape, so it can be bridged back with `to_sync`.

impl<F, A, O> AsyncFn<A, (CompletionHandler<O>,)> for Asyncified<F, A>
where
    F: Callable<A, Output = O> + Send + Sync + 'static,
    A: Send + 'static,
    O: 'static,
{
    type Handle = ();

    fn invoke(&self, args: A, (completion,): (CompletionHandler<O>,)) {
        self.call(args, completion)
    }
}

impl<F, A, T, E> AsyncFn<A, (CompletionHandler<T>, ErrorHandler<E>)> for Asyncified<F, A>
where
    F: Callable<A, Output = Result<T, E>> + Send + Sync + 'static,
    A: Send + 'static,
    T: 'static,
    E: 'static,
{
    type Handle = ();

    fn invoke(&self, args: A, (completion, on_error): (CompletionHandler<T>, ErrorHandler<E>)) {
        self.try_call(args, completion, on_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::{to_async, to_async_with};
    use crate::errors::Error;
    use crate::executor::Configuration;

    #[derive(Debug, PartialEq)]
    enum MathError {
        LessThanZero,
    }

    fn factorial(n: i64) -> Result<i64, MathError> {
        if n < 0 {
            Err(MathError::LessThanZero)
        } else {
            Ok((1..=n).product())
        }
    }

    #[test]
    fn call_returns_before_completion() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();

        let release_rx = std::sync::Mutex::new(release_rx);

        let slow = to_async(move |n: u32| {
            started_tx.send(()).unwrap();
            release_rx.lock().unwrap().recv().unwrap();
            n
        });

        slow.call((9,), move |n| done_tx.send(n).unwrap());

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(done_rx.try_recv().is_err());

        release_tx.send(()).unwrap();
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 9);
    }

    #[test]
    fn completion_runs_on_worker_thread() {
        let conf = {
            let mut conf = Configuration::default();
            conf.name.clear();
            conf.name.push_str("adder").unwrap();
            conf
        };

        let add = to_async_with(|a: i32, b: i32| a + b, &conf).unwrap();
        let (tx, rx) = mpsc::channel();

        add.call((1, 2), move |sum| {
            tx.send((sum, thread::current().name().map(str::to_owned)))
                .unwrap()
        });

        let (sum, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(sum, 3);
        assert!(name.unwrap().starts_with("adder-"));
    }

    #[test]
    fn try_call_reports_exactly_one_outcome() {
        let factorial = to_async(factorial);
        let (tx, rx) = mpsc::channel();

        for n in [5, -3] {
            let (ok, err) = (tx.clone(), tx.clone());

            factorial.try_call(
                (n,),
                move |value| ok.send(Ok(value)).unwrap(),
                move |error| err.send(Err(error)).unwrap(),
            );
        }

        drop(tx);

        let mut outcomes = rx.iter().collect::<Vec<_>>();
        outcomes.sort_by_key(|outcome| outcome.is_err());

        assert_eq!(outcomes, vec![Ok(120), Err(MathError::LessThanZero)]);
    }

    #[test]
    fn multiple_outputs_arrive_as_tuple() {
        let split = to_async(|a: i32, b: i32| (a + b, a - b));
        let (tx, rx) = mpsc::channel();

        split.call((1, 1), move |(sum, difference)| tx.send((sum, difference)).unwrap());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), (2, 0));
    }

    #[test]
    fn panicking_function_never_calls_back() {
        let (tx, rx) = mpsc::channel::<()>();

        let broken = to_async(|n: u8| -> u8 {
            if n > 0 {
                panic!("refusing {}", n)
            }
            n
        });

        broken.call((1,), move |_| tx.send(()).unwrap());

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn runs_on_caller_when_no_worker_starts() {
        let conf = Configuration {
            stack_size: Some(usize::MAX / 4),
            ..Default::default()
        };

        let add = to_async_with(|a: i32, b: i32| a + b, &conf).unwrap();
        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();

        add.call((2, 3), move |sum| tx.send((sum, thread::current().id())).unwrap());

        assert_eq!(rx.try_recv(), Ok((5, caller)));
        assert_eq!(
            crate::syncify::to_sync(add).call((4, 4)),
            8
        );
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut conf = Configuration::default();
        conf.name.push_str("\0").unwrap();

        assert!(matches!(
            to_async_with(|| (), &conf),
            Err(Error::InvalidName)
        ));
    }
}
