// ============================================================================
// pulse-state - ReactiveSet
// A HashSet whose mutations announce the touched element
// ============================================================================

use std::borrow::Borrow;
use std::collections::hash_set::Iter;
use std::collections::HashSet;
use std::hash::Hash;

use crate::notify::{Notifier, Observable, Subscription};

// =============================================================================
// REACTIVE SET
// =============================================================================

/// A set container that publishes a change notification after every
/// mutation, keyed by the element itself.
///
/// `insert` announces the element, `remove` announces it when the element
/// actually came out, `clear` announces a bulk change (global observers
/// only). Reads delegate to the underlying `HashSet`.
///
/// # Example
///
/// ```
/// use pulse_state::ReactiveSet;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut tags: ReactiveSet<String> = ReactiveSet::new();
/// let changed = Rc::new(Cell::new(0));
///
/// let changed_clone = changed.clone();
/// let _sub = tags.subscribe(move || changed_clone.set(changed_clone.get() + 1));
///
/// tags.insert("important".to_string());
/// assert_eq!(changed.get(), 1);
/// assert!(tags.contains(&"important".to_string()));
/// ```
pub struct ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    /// The underlying data
    data: HashSet<T>,

    /// The notification engine, owned by this set alone
    signals: Notifier<T>,
}

impl<T> ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    /// Create a new empty reactive set.
    pub fn new() -> Self {
        Self {
            data: HashSet::new(),
            signals: Notifier::new(),
        }
    }

    /// Create a reactive set with initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: HashSet::with_capacity(capacity),
            signals: Notifier::new(),
        }
    }

    /// Create a reactive set from an iterator.
    ///
    /// Seeding does not publish; observers do not exist yet.
    pub fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
            signals: Notifier::new(),
        }
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribe to every change of this set.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        self.signals.subscribe(f)
    }

    /// Subscribe to changes of one element.
    pub fn subscribe_key(&self, item: T, f: impl Fn() + 'static) -> Subscription {
        self.signals.subscribe_key(item, f)
    }

    /// Run `f` with deliveries deferred and collapsed per element.
    ///
    /// See [`Notifier::batch`] for the delivery rules.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let signals = self.signals.clone();
        signals.batch(|| f(self))
    }

    /// Run `f` with every delivery dropped.
    ///
    /// See [`Notifier::suspend`].
    pub fn suspend<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let signals = self.signals.clone();
        signals.suspend(|| f(self))
    }

    // =========================================================================
    // SIZE
    // =========================================================================

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Returns true if the set contains the specified value.
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains(item)
    }

    // =========================================================================
    // INSERT (add)
    // =========================================================================

    /// Adds a value to the set, then publishes it.
    ///
    /// The element is announced whether or not it was already present.
    /// Returns true if the value was newly inserted.
    pub fn insert(&mut self, item: T) -> bool {
        let is_new = self.data.insert(item.clone());
        self.signals.publish(&item);
        is_new
    }

    // =========================================================================
    // REMOVE (delete)
    // =========================================================================

    /// Removes a value from the set, returning whether it was present.
    ///
    /// The element is published only when it actually came out.
    pub fn remove<Q>(&mut self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.data.take(item) {
            Some(item) => {
                self.signals.publish(&item);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // CLEAR
    // =========================================================================

    /// Clears the set, then publishes a bulk change (global observers only).
    pub fn clear(&mut self) {
        self.data.clear();
        self.signals.publish_all();
    }

    // =========================================================================
    // ITERATION
    // =========================================================================

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        self.data.iter()
    }

    /// Iterates over each element.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&T),
    {
        for item in &self.data {
            f(item);
        }
    }

    // =========================================================================
    // SET OPERATIONS
    // =========================================================================

    /// Returns true if self is a subset of other.
    pub fn is_subset(&self, other: &ReactiveSet<T>) -> bool {
        self.data.is_subset(&other.data)
    }

    /// Returns true if self is a superset of other.
    pub fn is_superset(&self, other: &ReactiveSet<T>) -> bool {
        self.data.is_superset(&other.data)
    }

    /// Returns true if self has no elements in common with other.
    pub fn is_disjoint(&self, other: &ReactiveSet<T>) -> bool {
        self.data.is_disjoint(&other.data)
    }

    // =========================================================================
    // UTILITIES
    // =========================================================================

    /// Gets the underlying data.
    pub fn raw(&self) -> &HashSet<T> {
        &self.data
    }

    /// Gets mutable access to the underlying data.
    ///
    /// **Warning**: Mutations here won't publish notifications!
    pub fn raw_mut(&mut self) -> &mut HashSet<T> {
        &mut self.data
    }
}

impl<T> Observable for ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    type Key = T;

    fn signals(&self) -> &Notifier<T> {
        &self.signals
    }
}

impl<T> Default for ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ReactiveSet<T>
where
    T: Eq + Hash + Clone + 'static,
{
    fn clone(&self) -> Self {
        // Same data, fresh engine - clones get independent observers.
        Self::from_iter(self.data.clone())
    }
}

impl<T> std::fmt::Debug for ReactiveSet<T>
where
    T: Eq + Hash + Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveSet")
            .field("data", &self.data)
            .field("signals", &self.signals)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
