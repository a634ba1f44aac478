// ============================================================================
// pulse-state - ReactiveRecord
// A fixed-shape keyed record whose field writes announce the field
// ============================================================================

use std::borrow::Borrow;
use std::collections::hash_map::{Iter, Keys};
use std::collections::HashMap;
use std::hash::Hash;

use crate::notify::{Notifier, Observable, Subscription};

// =============================================================================
// REACTIVE RECORD
// =============================================================================

/// A keyed record whose key set is sealed at construction.
///
/// Unlike [`ReactiveMap`](crate::ReactiveMap), a record never grows or
/// shrinks: the fields named at construction are the fields it has for
/// life. Every write goes through [`set`](ReactiveRecord::set) or
/// [`update`](ReactiveRecord::update), which perform the assignment and
/// then publish the field's key. Writes to keys outside the record's
/// shape are rejected without assigning or publishing.
///
/// Subscription and scope control live on methods, not in the key
/// namespace, so a field may be called `"subscribe"` or `"batch"` without
/// shadowing anything.
///
/// # Example
///
/// ```
/// use pulse_state::ReactiveRecord;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut settings = ReactiveRecord::new([("volume", 50), ("rate", 1)]);
/// let changed = Rc::new(Cell::new(0));
///
/// let changed_clone = changed.clone();
/// let _sub = settings.subscribe_key("volume", move || {
///     changed_clone.set(changed_clone.get() + 1);
/// });
///
/// assert_eq!(settings.set("volume", 80), Some(50));
/// assert_eq!(changed.get(), 1);
///
/// // Not a field of this record: rejected, nothing published.
/// assert_eq!(settings.set("brightness", 10), None);
/// assert_eq!(changed.get(), 1);
/// ```
pub struct ReactiveRecord<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    /// The fields, fixed at construction
    data: HashMap<K, V>,

    /// The notification engine, owned by this record alone
    signals: Notifier<K>,
}

impl<K, V> ReactiveRecord<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    /// Create a record from its fields. The key set is fixed from here on.
    pub fn new<I: IntoIterator<Item = (K, V)>>(fields: I) -> Self {
        Self {
            data: fields.into_iter().collect(),
            signals: Notifier::new(),
        }
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribe to every field change of this record.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        self.signals.subscribe(f)
    }

    /// Subscribe to changes of one field.
    pub fn subscribe_key(&self, key: K, f: impl Fn() + 'static) -> Subscription {
        self.signals.subscribe_key(key, f)
    }

    /// Run `f` with deliveries deferred and collapsed per field.
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
    // READS
    // =========================================================================

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if `key` is one of the record's fields.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains_key(key)
    }

    /// Returns a reference to the field's value.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.get(key)
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Assign a new value to a field, then publish the field's key.
    ///
    /// Returns the previous value. If `key` is not one of the record's
    /// fields the write is rejected: nothing is assigned, nothing is
    /// published, and `None` is returned.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        match self.data.get_mut(&key) {
            Some(slot) => {
                let old_value = std::mem::replace(slot, value);
                self.signals.publish(&key);
                Some(old_value)
            }
            None => None,
        }
    }

    /// Mutate a field's value in place, then publish the field's key.
    ///
    /// Returns true if the field exists and `f` ran.
    pub fn update<F>(&mut self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        match self.data.get_mut(key) {
            Some(value) => {
                f(value);
                self.signals.publish(key);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // ITERATION
    // =========================================================================

    /// Returns an iterator over the field keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.data.keys()
    }

    /// Returns an iterator over (key, value) pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.data.iter()
    }

    /// Iterates over each field.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in &self.data {
            f(k, v);
        }
    }
}

impl<K, V> Observable for ReactiveRecord<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    type Key = K;

    fn signals(&self) -> &Notifier<K> {
        &self.signals
    }
}

impl<K, V> Clone for ReactiveRecord<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
{
    fn clone(&self) -> Self {
        // Same fields, fresh engine - clones get independent observers.
        Self::new(self.data.clone())
    }
}

impl<K, V> std::fmt::Debug for ReactiveRecord<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveRecord")
            .field("data", &self.data)
            .field("signals", &self.signals)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
