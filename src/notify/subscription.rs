// ============================================================================
// pulse-state - Observers and Subscriptions
// Callback handles and the unsubscribe side of the registry
// ============================================================================

use std::rc::Rc;

// =============================================================================
// OBSERVER
// =============================================================================

/// A zero-argument callback registered to run on a notification.
///
/// Observer identity is `Rc` pointer identity: registering the same
/// `Observer` handle twice under the same scope is a no-op for delivery,
/// while two closures built from identical source are still two distinct
/// observers.
pub type Observer = Rc<dyn Fn()>;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle returned by every subscribe call.
///
/// `unsubscribe` removes exactly the one registration that produced this
/// handle. Calling it more than once is safe, and so is calling it after
/// the container (and its notifier) has been dropped - the handle only
/// holds a weak reference back to the registry.
///
/// Dropping a `Subscription` does NOT unsubscribe; an observer stays
/// registered until `unsubscribe` is called or the notifier goes away.
///
/// # Example
///
/// ```
/// use pulse_state::ReactiveMap;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut map: ReactiveMap<&str, i32> = ReactiveMap::new();
/// let calls = Rc::new(Cell::new(0));
///
/// let calls_clone = calls.clone();
/// let sub = map.subscribe(move || calls_clone.set(calls_clone.get() + 1));
///
/// map.insert("one", 1);
/// assert_eq!(calls.get(), 1);
///
/// sub.unsubscribe();
/// map.insert("two", 2);
/// assert_eq!(calls.get(), 1);
///
/// sub.unsubscribe(); // idempotent
/// ```
#[derive(Clone)]
pub struct Subscription {
    cancel: Rc<dyn Fn()>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl Fn() + 'static) -> Self {
        Self {
            cancel: Rc::new(cancel),
        }
    }

    /// Remove this subscription's observer from its registry.
    pub fn unsubscribe(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
