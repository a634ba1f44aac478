// ============================================================================
// pulse-state - ReactiveMap
// A HashMap whose mutations announce the touched key
// ============================================================================

use std::borrow::Borrow;
use std::collections::hash_map::{Iter, Keys, Values};
use std::collections::HashMap;
use std::hash::Hash;

use crate::notify::{Notifier, Observable, Subscription};

// =============================================================================
// REACTIVE MAP
// =============================================================================

/// A key→value container that publishes a change notification after every
/// mutation.
///
/// Reads pass straight through to the underlying `HashMap`. Mutations go
/// through the wrapper, which performs the real operation first and then
/// publishes: `insert` announces the key, `remove` announces the key when
/// an entry actually came out, `clear` announces a bulk change (global
/// observers only).
///
/// # Example
///
/// ```
/// use pulse_state::ReactiveMap;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut users: ReactiveMap<String, i32> = ReactiveMap::new();
/// let changed = Rc::new(Cell::new(0));
///
/// let changed_clone = changed.clone();
/// let _sub = users.subscribe_key("alice".to_string(), move || {
///     changed_clone.set(changed_clone.get() + 1);
/// });
///
/// users.insert("alice".to_string(), 25);
/// users.insert("bob".to_string(), 30); // different key, not delivered
///
/// assert_eq!(changed.get(), 1);
/// assert_eq!(users.get(&"alice".to_string()), Some(&25));
/// ```
pub struct ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    /// The underlying data
    data: HashMap<K, V>,

    /// The notification engine, owned by this map alone
    signals: Notifier<K>,
}

impl<K, V> ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    /// Create a new empty reactive map.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            signals: Notifier::new(),
        }
    }

    /// Create a reactive map with initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: HashMap::with_capacity(capacity),
            signals: Notifier::new(),
        }
    }

    /// Create a reactive map from an iterator.
    ///
    /// Seeding does not publish; observers do not exist yet.
    pub fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
            signals: Notifier::new(),
        }
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribe to every change of this map.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        self.signals.subscribe(f)
    }

    /// Subscribe to changes of one key.
    pub fn subscribe_key(&self, key: K, f: impl Fn() + 'static) -> Subscription {
        self.signals.subscribe_key(key, f)
    }

    /// Run `f` with deliveries deferred and collapsed per key.
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

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains_key(key)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.get(key)
    }

    // =========================================================================
    // INSERT (set)
    // =========================================================================

    /// Inserts a key-value pair into the map, then publishes the key.
    ///
    /// The key is announced whether it was new or an overwrite. Returns
    /// the displaced value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let old_value = self.data.insert(key.clone(), value);
        self.signals.publish(&key);
        old_value
    }

    /// Mutate the value under `key` in place, then publish the key.
    ///
    /// Returns true if the entry existed and `f` ran; a miss publishes
    /// nothing.
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
    // REMOVE (delete)
    // =========================================================================

    /// Removes a key from the map, returning the value if it was present.
    ///
    /// The key is published only when an entry actually came out.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.data.remove_entry(key) {
            Some((key, value)) => {
                self.signals.publish(&key);
                Some(value)
            }
            None => None,
        }
    }

    // =========================================================================
    // CLEAR
    // =========================================================================

    /// Clears the map, then publishes a bulk change (global observers only).
    pub fn clear(&mut self) {
        self.data.clear();
        self.signals.publish_all();
    }

    // =========================================================================
    // ITERATION
    // =========================================================================

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.data.keys()
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        self.data.values()
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.data.iter()
    }

    /// Iterates over each key-value pair.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in &self.data {
            f(k, v);
        }
    }

    // =========================================================================
    // UTILITIES
    // =========================================================================

    /// Gets the underlying data.
    pub fn raw(&self) -> &HashMap<K, V> {
        &self.data
    }

    /// Gets mutable access to the underlying data.
    ///
    /// **Warning**: Mutations here won't publish notifications!
    pub fn raw_mut(&mut self) -> &mut HashMap<K, V> {
        &mut self.data
    }
}

impl<K, V> Observable for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    type Key = K;

    fn signals(&self) -> &Notifier<K> {
        &self.signals
    }
}

impl<K, V> Default for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
{
    fn clone(&self) -> Self {
        // Same data, fresh engine - clones get independent observers.
        Self::from_iter(self.data.clone())
    }
}

impl<K, V> std::fmt::Debug for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveMap")
            .field("data", &self.data)
            .field("signals", &self.signals)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
