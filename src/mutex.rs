use core::ops::{Deref, DerefMut};

use std::sync::PoisonError;

/// A simple Mutex trait, so that the rendezvous can be built on top of
/// something other than `std::sync::Mutex`.
///
/// The locking method does NOT take &mut self. This makes it compatible with `Arc`,
/// i.e. it can be passed around to the thread that fires a callback freely.
pub trait Mutex {
    /// Data protected by the mutex.
    type Data;

    type Guard<'a>: Deref<Target = Self::Data> + DerefMut<Target = Self::Data>
    where
        Self::Data: 'a,
        Self: 'a;

    fn new(data: Self::Data) -> Self;

    fn lock(&self) -> Self::Guard<'_>;
}

/// The condition variable paired with a [`Mutex`].
pub trait Condvar {
    type Mutex<T>: Mutex<Data = T>;

    fn new() -> Self;

    fn wait<'a, T>(
        &self,
        guard: <Self::Mutex<T> as Mutex>::Guard<'a>,
    ) -> <Self::Mutex<T> as Mutex>::Guard<'a>
    where
        T: 'a,
        Self::Mutex<T>: 'a;

    fn notify_all(&self);
}

impl<T> Mutex for std::sync::Mutex<T> {
    type Data = T;

    type Guard<'a>
    = std::sync::MutexGuard<'a, T>
    where
        T: 'a;

    #[inline(always)]
    fn new(data: Self::Data) -> Self {
        std::sync::Mutex::new(data)
    }

    #[inline(always)]
    fn lock(&self) -> Self::Guard<'_> {
        // Guarded data is only ever a counter or a single slot, both of which
        // are consistent even if a holder panicked.
        std::sync::Mutex::lock(self).unwrap_or_else(PoisonError::into_inner)
    }
}

impl Condvar for std::sync::Condvar {
    type Mutex<T> = std::sync::Mutex<T>;

    #[inline(always)]
    fn new() -> Self {
        std::sync::Condvar::new()
    }

    fn wait<'a, T>(&self, guard: std::sync::MutexGuard<'a, T>) -> std::sync::MutexGuard<'a, T>
    where
        T: 'a,
    {
        std::sync::Condvar::wait(self, guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_all(&self) {
        std::sync::Condvar::notify_all(self)
    }
}
