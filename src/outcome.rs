use core::fmt;

use std::sync::Arc;

use crate::mutex::Mutex;
use crate::rendezvous::Rendezvous;

/// Storage for the eventual result of one bridged call.
///
/// Written by whichever callback fires, read once by the bridging call after
/// the rendezvous completes. A second write replaces the first.
pub struct OutcomeSlot<T>(std::sync::Mutex<Option<T>>);

impl<T> OutcomeSlot<T> {
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    pub fn put(&self, value: T) {
        *Mutex::lock(&self.0) = Some(value);
    }

    pub fn take(&self) -> Option<T> {
        Mutex::lock(&self.0).take()
    }

    pub fn is_filled(&self) -> bool {
        Mutex::lock(&self.0).is_some()
    }
}

impl<T> Default for OutcomeSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OutcomeSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeSlot")
            .field("filled", &self.is_filled())
            .finish()
    }
}

/// The write side of a call's slot and rendezvous, as handed to the callbacks.
pub struct Notifier<T>(Arc<(OutcomeSlot<T>, Rendezvous)>);

impl<T> Notifier<T> {
    pub fn new(exchange: Arc<(OutcomeSlot<T>, Rendezvous)>) -> Self {
        Self(exchange)
    }

    /// Stores `value` and then releases the waiting caller.
    pub fn notify(&self, value: T) {
        let (slot, rendezvous) = &*self.0;

        slot.put(value);
        rendezvous.leave();
    }
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Notifier").field(&self.0 .0).field(&self.0 .1).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::{Notifier, OutcomeSlot};
    use crate::rendezvous::Rendezvous;

    #[test]
    fn last_write_wins() {
        let slot = OutcomeSlot::new();
        slot.put(1);
        slot.put(2);

        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn notify_fills_slot_before_release() {
        let exchange = Arc::new((OutcomeSlot::new(), Rendezvous::new()));
        exchange.1.enter();

        let notifier = Notifier::new(exchange.clone());
        thread::spawn(move || notifier.notify("done"));

        exchange.1.wait();
        assert_eq!(exchange.0.take(), Some("done"));
    }
}
