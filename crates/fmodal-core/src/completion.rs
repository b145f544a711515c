#![forbid(unsafe_code)]

//! Resolve-once completion values for host-driven asynchronous work.
//!
//! A [`Resolver`] is handed to whoever performs the work (an image loader,
//! typically); the matching [`Completion`] is kept by whoever waits for it.
//! Resolution consumes the resolver, so a completion can settle at most once.
//!
//! Everything here is single-threaded: the host event loop resolves and polls
//! on the same thread, so the shared slot is an `Rc<RefCell<_>>`.
//!
//! # Example
//!
//! ```
//! use fmodal_core::completion::Completion;
//!
//! let (resolver, mut completion) = Completion::<u32>::pending();
//! assert!(!completion.is_settled());
//! resolver.resolve(7);
//! assert_eq!(completion.take(), Some(7));
//! assert_eq!(completion.take(), None);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

enum Slot<T> {
    Pending,
    Ready(T),
    Taken,
}

/// The waiting half of a resolve-once pair.
pub struct Completion<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

/// The resolving half. Consumed by [`resolve`](Self::resolve).
pub struct Resolver<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Completion<T> {
    /// Create an unresolved pair.
    #[must_use]
    pub fn pending() -> (Resolver<T>, Self) {
        let slot = Rc::new(RefCell::new(Slot::Pending));
        (
            Resolver {
                slot: Rc::clone(&slot),
            },
            Self { slot },
        )
    }

    /// Create a completion that is already resolved.
    #[must_use]
    pub fn ready(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::Ready(value))),
        }
    }

    /// True once the resolver has fired (even if the value was taken).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(*self.slot.borrow(), Slot::Pending)
    }

    /// True if the resolver was dropped without resolving.
    ///
    /// Such a completion can never settle.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        Rc::strong_count(&self.slot) == 1 && matches!(*self.slot.borrow(), Slot::Pending)
    }

    /// Take the resolved value. Returns `Some` exactly once.
    pub fn take(&mut self) -> Option<T> {
        let mut slot = self.slot.borrow_mut();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(value) => Some(value),
            Slot::Pending => {
                *slot = Slot::Pending;
                None
            }
            Slot::Taken => None,
        }
    }
}

impl<T> Resolver<T> {
    /// Settle the paired completion.
    pub fn resolve(self, value: T) {
        let mut slot = self.slot.borrow_mut();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Ready(value);
        }
    }

    /// True if the waiting side was dropped; resolving is then pointless.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        Rc::strong_count(&self.slot) == 1
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.slot.borrow() {
            Slot::Pending => "pending",
            Slot::Ready(_) => "ready",
            Slot::Taken => "taken",
        };
        f.debug_struct("Completion").field("state", &state).finish()
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("orphaned", &self.is_orphaned())
            .finish()
    }
}
