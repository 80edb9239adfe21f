//! A counting completion handshake between the thread that waits for some
//! work and the thread(s) that finish it.

use core::fmt;

use crate::mutex::{Condvar, Mutex};

/// Blocks one thread until every unit of work registered with [`Rendezvous::enter`]
/// has been matched by a [`Rendezvous::leave`].
///
/// `enter` and `wait` are usually called by one thread while `leave` is called
/// from whatever thread completes the work. There is no timeout: if a matching
/// `leave` never comes, `wait` never returns.
pub struct Rendezvous<V = std::sync::Condvar>
where
    V: Condvar,
{
    pending: V::Mutex<usize>,
    condvar: V,
}

impl Rendezvous {
    pub fn new() -> Self {
        Self::wrap(Mutex::new(0), Condvar::new())
    }
}

impl<V> Rendezvous<V>
where
    V: Condvar,
{
    pub fn wrap(pending: V::Mutex<usize>, condvar: V) -> Self {
        Self { pending, condvar }
    }

    /// Registers one pending unit of work.
    pub fn enter(&self) {
        *self.pending.lock() += 1;
    }

    /// Marks one unit of work as done, waking the waiter once none is left.
    ///
    /// Leaving more often than entering is tolerated: the count never drops below zero.
    pub fn leave(&self) {
        let mut pending = self.pending.lock();

        *pending = pending.saturating_sub(1);

        if *pending == 0 {
            self.condvar.notify_all();
        }
    }

    /// Blocks the calling thread until the pending count is zero.
    pub fn wait(&self) {
        let mut pending = self.pending.lock();

        while *pending > 0 {
            pending = self.condvar.wait(pending);
        }
    }

    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Rendezvous<V>
where
    V: Condvar,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendezvous")
            .field("pending", &self.pending())
            .finish()
    }
}
