// ============================================================================
// pulse-state - Observable
// The contract a reactive container offers its caller, plus the
// free-function surface over it
// ============================================================================

use std::hash::Hash;

use super::hub::Notifier;
use super::subscription::Subscription;

// =============================================================================
// OBSERVABLE TRAIT
// =============================================================================

/// A container that announces its mutations through a [`Notifier`].
///
/// Every reactive container owns exactly one engine, created with it and
/// never rebound. Implementing this trait is all an adapter needs to do
/// for the free functions ([`subscribe`], [`batch`], ...) to work on it.
pub trait Observable {
    /// The key type mutations are announced under.
    type Key: Eq + Hash + Clone + 'static;

    /// The container's notification engine.
    fn signals(&self) -> &Notifier<Self::Key>;
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Subscribe to every change of a reactive container.
///
/// # Example
///
/// ```
/// use pulse_state::{subscribe, ReactiveMap};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut map: ReactiveMap<&str, i32> = ReactiveMap::new();
/// let calls = Rc::new(Cell::new(0));
///
/// let calls_clone = calls.clone();
/// let sub = subscribe(&map, move || calls_clone.set(calls_clone.get() + 1));
///
/// map.insert("one", 1);
/// assert_eq!(calls.get(), 1);
/// assert_eq!(map.get(&"one"), Some(&1));
///
/// sub.unsubscribe();
/// map.insert("two", 2);
/// assert_eq!(calls.get(), 1);
/// ```
pub fn subscribe<T: Observable>(x: &T, f: impl Fn() + 'static) -> Subscription {
    x.signals().subscribe(f)
}

/// Subscribe to changes of one specific key of a reactive container.
pub fn subscribe_key<T: Observable>(x: &T, key: T::Key, f: impl Fn() + 'static) -> Subscription {
    x.signals().subscribe_key(key, f)
}

/// Run a series of mutations with deliveries deferred and collapsed.
///
/// The body receives the container back, so it can mutate under the open
/// scope. See [`Notifier::batch`] for the delivery rules.
///
/// # Example
///
/// ```
/// use pulse_state::{batch, subscribe, ReactiveMap};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut map: ReactiveMap<&str, i32> = ReactiveMap::new();
/// let calls = Rc::new(Cell::new(0));
///
/// let calls_clone = calls.clone();
/// let _sub = subscribe(&map, move || calls_clone.set(calls_clone.get() + 1));
///
/// batch(&mut map, |map| {
///     map.insert("one", 1);
///     map.insert("two", 2);
/// });
///
/// assert_eq!(calls.get(), 1);
/// ```
pub fn batch<T: Observable, R>(x: &mut T, f: impl FnOnce(&mut T) -> R) -> R {
    let signals = x.signals().clone();
    signals.batch(|| f(x))
}

/// Run a series of mutations with every delivery dropped.
///
/// The mutations land in the container; their notifications are gone for
/// good. See [`Notifier::suspend`].
///
/// # Example
///
/// ```
/// use pulse_state::{subscribe_key, suspend, ReactiveSet};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut set: ReactiveSet<&str> = ReactiveSet::new();
/// let calls = Rc::new(Cell::new(0));
///
/// let calls_clone = calls.clone();
/// let _sub = subscribe_key(&set, "one", move || calls_clone.set(calls_clone.get() + 1));
///
/// suspend(&mut set, |set| {
///     set.insert("one");
/// });
///
/// assert_eq!(calls.get(), 0);
/// assert!(set.contains(&"one"));
/// ```
pub fn suspend<T: Observable, R>(x: &mut T, f: impl FnOnce(&mut T) -> R) -> R {
    let signals = x.signals().clone();
    signals.suspend(|| f(x))
}
