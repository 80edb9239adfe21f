use core::fmt;
use core::time::Duration;

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::sync::Arc;

use std::panic::{self, AssertUnwindSafe};
use std::sync::PoisonError;
use std::thread;

#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::mutex::Mutex;

pub const DEFAULT_NAME: &str = "sync-async";
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct Configuration {
    /// Prefix of the worker thread names; workers are named `<name>-<n>`
    pub name: heapless::String<32>,
    /// Stack size of each worker thread; the platform default if `None`
    pub stack_size: Option<usize>,
    /// How long an idle worker waits for a new job before it exits
    pub keep_alive: Duration,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut name = heapless::String::new();
        let _ = name.push_str(DEFAULT_NAME);

        Configuration {
            name,
            stack_size: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct State {
    jobs: VecDeque<Job>,
    workers: usize,
    idle: usize,
    spawned: usize,
    closed: bool,
}

struct Shared {
    state: std::sync::Mutex<State>,
    condvar: std::sync::Condvar,
    conf: Configuration,
}

/// A growable pool of worker threads which runs every submitted job concurrently.
///
/// Whenever the queued jobs outnumber the idle workers, a new worker is started,
/// so jobs never wait on one another. Workers that stay idle for
/// [`Configuration::keep_alive`] exit. Dropping the pool does not cancel queued
/// jobs: the remaining workers run them and then exit.
pub struct WorkerPool(Arc<Shared>);

impl WorkerPool {
    pub fn new(conf: &Configuration) -> Result<Self, Error> {
        if conf.name.contains('\0') {
            return Err(Error::InvalidName);
        }

        Ok(Self::wrap(conf.clone()))
    }

    fn wrap(conf: Configuration) -> Self {
        Self(Arc::new(Shared {
            state: Mutex::new(State {
                jobs: VecDeque::new(),
                workers: 0,
                idle: 0,
                spawned: 0,
                closed: false,
            }),
            condvar: std::sync::Condvar::new(),
            conf,
        }))
    }

    /// Queues `job` and makes sure a worker is available to pick it up.
    ///
    /// If a new worker cannot be started but others are still running, the job
    /// stays queued for the next one that becomes free. If no worker is left
    /// at all, the queued jobs are handed back in [`Rejected`] so that they are
    /// not stranded.
    pub fn execute<F>(&self, job: F) -> Result<(), Rejected>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = Mutex::lock(&self.0.state);

        state.jobs.push_back(Box::new(job));

        if state.jobs.len() <= state.idle {
            self.0.condvar.notify_one();
            return Ok(());
        }

        let index = state.spawned;
        state.spawned += 1;
        state.workers += 1;

        drop(state);

        if let Err(error) = Worker::spawn(self.0.clone(), index) {
            let mut state = Mutex::lock(&self.0.state);
            state.workers -= 1;

            if state.workers == 0 {
                let jobs = state.jobs.drain(..).collect();

                return Err(Rejected { jobs, error });
            }

            log::warn!("{}, the job stays queued until a worker is free", error);
        }

        Ok(())
    }

    pub fn workers(&self) -> usize {
        Mutex::lock(&self.0.state).workers
    }

    pub fn idle(&self) -> usize {
        Mutex::lock(&self.0.state).idle
    }

    pub fn configuration(&self) -> &Configuration {
        &self.0.conf
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::wrap(Configuration::default())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        Mutex::lock(&self.0.state).closed = true;
        self.0.condvar.notify_all();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = Mutex::lock(&self.0.state);

        f.debug_struct("WorkerPool")
            .field("name", &self.0.conf.name)
            .field("workers", &state.workers)
            .field("idle", &state.idle)
            .field("queued", &state.jobs.len())
            .finish()
    }
}

/// Jobs the pool could not run because none of its worker threads is alive and
/// no new one could be started.
pub struct Rejected {
    jobs: VecDeque<Job>,
    error: Error,
}

impl Rejected {
    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Runs the rejected jobs on the current thread, in submission order.
    pub fn run(self) {
        for job in self.jobs {
            job();
        }
    }

    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Debug for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("jobs", &self.jobs.len())
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} job(s) rejected: {}", self.jobs.len(), self.error)
    }
}

struct Worker(Arc<Shared>);

impl Worker {
    fn spawn(shared: Arc<Shared>, index: usize) -> Result<(), Error> {
        let mut builder = thread::Builder::new().name(format!("{}-{}", shared.conf.name, index));

        if let Some(stack_size) = shared.conf.stack_size {
            builder = builder.stack_size(stack_size);
        }

        builder.spawn(move || Worker(shared).run())?;

        log::debug!("Started worker {}", index);

        Ok(())
    }

    fn run(self) {
        let shared = &self.0;
        let mut state = Mutex::lock(&shared.state);

        loop {
            if let Some(job) = state.jobs.pop_front() {
                drop(state);

                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    log::error!("Job panicked in {:?}", thread::current().name());
                }

                state = Mutex::lock(&shared.state);
            } else if state.closed {
                break;
            } else {
                state.idle += 1;

                let (guard, timeout) = shared
                    .condvar
                    .wait_timeout(state, shared.conf.keep_alive)
                    .unwrap_or_else(PoisonError::into_inner);

                state = guard;
                state.idle -= 1;

                if timeout.timed_out() && state.jobs.is_empty() {
                    break;
                }
            }
        }

        state.workers -= 1;

        log::debug!("Retired worker {:?}", thread::current().name());
    }
}
