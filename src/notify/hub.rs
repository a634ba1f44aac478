// ============================================================================
// pulse-state - Notifier
// The per-container notification engine: registries, publish, batch, suspend
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use super::subscription::{Observer, Subscription};

// =============================================================================
// NOTIFIER<K> - The public engine handle
// =============================================================================

/// The notification engine behind every reactive container.
///
/// One `Notifier` belongs to exactly one container. It keeps two observer
/// registries - keyed and global - and decides per publish whether
/// observers run now (immediate), later (inside a [`batch`](Notifier::batch)
/// scope) or never (inside a [`suspend`](Notifier::suspend) scope).
///
/// The handle is a cheap clone over shared state, so a scope method can
/// hold one while the owning container is mutated.
///
/// # Example
///
/// ```
/// use pulse_state::Notifier;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let changes: Notifier<&str> = Notifier::new();
/// let seen = Rc::new(Cell::new(0));
///
/// let seen_clone = seen.clone();
/// let sub = changes.subscribe_key("volume", move || {
///     seen_clone.set(seen_clone.get() + 1);
/// });
///
/// changes.publish(&"volume");
/// changes.publish(&"rate"); // different key, not delivered
/// assert_eq!(seen.get(), 1);
///
/// sub.unsubscribe();
/// ```
pub struct Notifier<K> {
    inner: Rc<NotifierInner<K>>,
}

impl<K> Clone for Notifier<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// =============================================================================
// NOTIFIER INNER
// =============================================================================

/// The engine state proper.
///
/// Everything is interior-mutable so the public handle works through `&self`;
/// there is no locking because a notifier never leaves its thread.
struct NotifierInner<K> {
    /// Per-key observer lists, created lazily on first keyed subscription
    /// and pruned when a key's last observer unsubscribes.
    keyed: RefCell<HashMap<K, Vec<Observer>>>,

    /// Observers notified on every publish regardless of key.
    global: RefCell<Vec<Observer>>,

    /// `None` when not batching; otherwise the distinct keys published
    /// since the batch began, in first-publish order.
    batched: RefCell<Option<Vec<K>>>,

    /// While set, every publish is dropped with no replay.
    suspended: Cell<bool>,
}

impl<K> NotifierInner<K>
where
    K: Eq + Hash + Clone + 'static,
{
    /// Run the observers registered for `key`.
    ///
    /// The list is snapshotted before anything is invoked, so an observer
    /// may subscribe, unsubscribe or mutate the container mid-delivery
    /// without hitting a borrow error. Observers added mid-delivery are
    /// not part of the in-flight snapshot.
    fn notify_key(&self, key: &K) {
        let snapshot: Vec<Observer> = match self.keyed.borrow().get(key) {
            Some(observers) => observers.clone(),
            None => return,
        };
        for observer in snapshot {
            observer();
        }
    }

    /// Run every global observer, snapshotted the same way.
    fn notify_global(&self) {
        let snapshot: Vec<Observer> = self.global.borrow().clone();
        for observer in snapshot {
            observer();
        }
    }
}

// =============================================================================
// SUBSCRIBE
// =============================================================================

impl<K> Notifier<K>
where
    K: Eq + Hash + Clone + 'static,
{
    /// Create an engine with empty registries, not batching, not suspended.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(NotifierInner {
                keyed: RefCell::new(HashMap::new()),
                global: RefCell::new(Vec::new()),
                batched: RefCell::new(None),
                suspended: Cell::new(false),
            }),
        }
    }

    /// Register a global observer: it runs on every publish.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        self.subscribe_observer(Rc::new(f))
    }

    /// Register a shared [`Observer`] handle as a global observer.
    ///
    /// Registering the same handle twice is a delivery no-op.
    pub fn subscribe_observer(&self, observer: Observer) -> Subscription {
        {
            let mut global = self.inner.global.borrow_mut();
            if !global.iter().any(|o| Rc::ptr_eq(o, &observer)) {
                global.push(observer.clone());
            }
        }

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.global.borrow_mut().retain(|o| !Rc::ptr_eq(o, &observer));
            }
        })
    }

    /// Register an observer for one specific key.
    ///
    /// The key's observer list is created on first subscription.
    pub fn subscribe_key(&self, key: K, f: impl Fn() + 'static) -> Subscription {
        self.subscribe_key_observer(key, Rc::new(f))
    }

    /// Register a shared [`Observer`] handle under `key`, deduplicated by
    /// handle identity.
    pub fn subscribe_key_observer(&self, key: K, observer: Observer) -> Subscription {
        {
            let mut keyed = self.inner.keyed.borrow_mut();
            let entry = keyed.entry(key.clone()).or_default();
            if !entry.iter().any(|o| Rc::ptr_eq(o, &observer)) {
                entry.push(observer.clone());
            }
        }

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut keyed = inner.keyed.borrow_mut();
                if let Some(entry) = keyed.get_mut(&key) {
                    entry.retain(|o| !Rc::ptr_eq(o, &observer));
                    if entry.is_empty() {
                        keyed.remove(&key);
                    }
                }
            }
        })
    }

    // =========================================================================
    // PUBLISH
    // =========================================================================

    /// Announce a single-key change.
    ///
    /// Suspended: dropped, permanently. Batching: the key joins the batch
    /// queue (once). Otherwise the key's observers run, then every global
    /// observer, synchronously on the caller's stack.
    pub fn publish(&self, key: &K) {
        if self.inner.suspended.get() {
            return;
        }

        {
            let mut batched = self.inner.batched.borrow_mut();
            if let Some(queue) = batched.as_mut() {
                if !queue.contains(key) {
                    queue.push(key.clone());
                }
                return;
            }
        }

        self.inner.notify_key(key);
        self.inner.notify_global();
    }

    /// Announce a bulk change with no single key (a clear).
    ///
    /// Runs global observers only. Dropped while suspended, and dropped
    /// entirely while batching - the batch's own end-of-scope global
    /// delivery is all a bulk change gets.
    pub fn publish_all(&self) {
        if self.inner.suspended.get() {
            return;
        }
        if self.inner.batched.borrow().is_some() {
            return;
        }
        self.inner.notify_global();
    }

    // =========================================================================
    // BATCH
    // =========================================================================

    /// Run `f` with keyed deliveries deferred and collapsed.
    ///
    /// While the scope is open, each published key is queued once no
    /// matter how often it repeats, and bulk publishes are dropped. On
    /// return, each queued key's observers run in first-publish order,
    /// then every global observer runs exactly once - even when nothing
    /// was queued, so an empty batch is still a "batch completed" signal.
    ///
    /// Batch scopes do not nest: a nested call installs a fresh queue and
    /// the outer accumulation is discarded.
    ///
    /// If `f` panics the scope is released and nothing is replayed, so
    /// the engine is usable afterwards.
    ///
    /// # Example
    ///
    /// ```
    /// use pulse_state::Notifier;
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let changes: Notifier<&str> = Notifier::new();
    /// let runs = Rc::new(Cell::new(0));
    ///
    /// let runs_clone = runs.clone();
    /// let _sub = changes.subscribe_key("one", move || {
    ///     runs_clone.set(runs_clone.get() + 1);
    /// });
    ///
    /// changes.batch(|| {
    ///     changes.publish(&"one");
    ///     changes.publish(&"one");
    ///     assert_eq!(runs.get(), 0);
    /// });
    ///
    /// // Collapsed to a single delivery.
    /// assert_eq!(runs.get(), 1);
    /// ```
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        // A nested entry clobbers the outer queue.
        *self.inner.batched.borrow_mut() = Some(Vec::new());

        struct BatchGuard<'a, K> {
            batched: &'a RefCell<Option<Vec<K>>>,
        }

        impl<K> Drop for BatchGuard<'_, K> {
            fn drop(&mut self) {
                self.batched.borrow_mut().take();
            }
        }

        let guard = BatchGuard {
            batched: &self.inner.batched,
        };
        let result = f();

        // Normal exit: leave batch mode before replaying, so an observer
        // that mutates the container publishes immediately.
        let queued = self.inner.batched.borrow_mut().take().unwrap_or_default();
        drop(guard);

        for key in &queued {
            self.inner.notify_key(key);
        }
        self.inner.notify_global();

        result
    }

    /// Whether a batch scope is currently open.
    pub fn is_batching(&self) -> bool {
        self.inner.batched.borrow().is_some()
    }

    // =========================================================================
    // SUSPEND
    // =========================================================================

    /// Run `f` with every publish dropped.
    ///
    /// Changes made inside the scope are never announced - there is no
    /// replay when the scope ends. The previous suspension state is
    /// restored on every exit path, including a panic in `f`, so suspend
    /// scopes nest.
    ///
    /// # Example
    ///
    /// ```
    /// use pulse_state::Notifier;
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let changes: Notifier<&str> = Notifier::new();
    /// let runs = Rc::new(Cell::new(0));
    ///
    /// let runs_clone = runs.clone();
    /// let _sub = changes.subscribe(move || runs_clone.set(runs_clone.get() + 1));
    ///
    /// changes.suspend(|| changes.publish(&"one"));
    /// assert_eq!(runs.get(), 0);
    ///
    /// changes.publish(&"one");
    /// assert_eq!(runs.get(), 1);
    /// ```
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = self.inner.suspended.replace(true);

        struct SuspendGuard<'a> {
            suspended: &'a Cell<bool>,
            prev: bool,
        }

        impl Drop for SuspendGuard<'_> {
            fn drop(&mut self) {
                self.suspended.set(self.prev);
            }
        }

        let _guard = SuspendGuard {
            suspended: &self.inner.suspended,
            prev,
        };
        f()
    }

    /// Whether a suspend scope is currently open.
    pub fn is_suspended(&self) -> bool {
        self.inner.suspended.get()
    }
}

impl<K> Default for Notifier<K>
where
    K: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for Notifier<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("keyed_observers", &self.inner.keyed.borrow().len())
            .field("global_observers", &self.inner.global.borrow().len())
            .field("batching", &self.inner.batched.borrow().is_some())
            .field("suspended", &self.inner.suspended.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn counter() -> (Rc<Cell<i32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        (count, move || count_clone.set(count_clone.get() + 1))
    }

    #[test]
    fn keyed_then_global_order() {
        let changes: Notifier<&str> = Notifier::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let order_clone = order.clone();
        let _keyed = changes.subscribe_key("one", move || {
            order_clone.borrow_mut().push("keyed");
        });
        let order_clone = order.clone();
        let _global = changes.subscribe(move || {
            order_clone.borrow_mut().push("global");
        });

        changes.publish(&"one");
        assert_eq!(*order.borrow(), vec!["keyed", "global"]);
    }

    #[test]
    fn keyed_observer_ignores_other_keys() {
        let changes: Notifier<&str> = Notifier::new();
        let (count, observer) = counter();

        let _sub = changes.subscribe_key("one", observer);

        changes.publish(&"two");
        assert_eq!(count.get(), 0);

        changes.publish(&"one");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn publish_all_runs_global_only() {
        let changes: Notifier<&str> = Notifier::new();
        let (keyed_count, keyed_observer) = counter();
        let (global_count, global_observer) = counter();

        let _keyed = changes.subscribe_key("one", keyed_observer);
        let _global = changes.subscribe(global_observer);

        changes.publish_all();
        assert_eq!(keyed_count.get(), 0);
        assert_eq!(global_count.get(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let changes: Notifier<&str> = Notifier::new();
        let (count, observer) = counter();

        let sub = changes.subscribe(observer);
        changes.publish(&"one");
        assert_eq!(count.get(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        changes.publish(&"one");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unsubscribe_leaves_other_observers_alone() {
        let changes: Notifier<&str> = Notifier::new();
        let (first_count, first_observer) = counter();
        let (second_count, second_observer) = counter();

        let first = changes.subscribe_key("one", first_observer);
        let _second = changes.subscribe_key("one", second_observer);

        first.unsubscribe();
        changes.publish(&"one");
        assert_eq!(first_count.get(), 0);
        assert_eq!(second_count.get(), 1);
    }

    #[test]
    fn unsubscribe_after_notifier_dropped_is_noop() {
        let changes: Notifier<&str> = Notifier::new();
        let (_, observer) = counter();
        let sub = changes.subscribe(observer);

        drop(changes);
        sub.unsubscribe(); // must not panic
    }

    #[test]
    fn shared_observer_registers_once() {
        let changes: Notifier<&str> = Notifier::new();
        let (count, observer) = counter();
        let observer: Observer = Rc::new(observer);

        let _first = changes.subscribe_observer(observer.clone());
        let _second = changes.subscribe_observer(observer.clone());

        changes.publish(&"one");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn distinct_closures_are_distinct_observers() {
        let changes: Notifier<&str> = Notifier::new();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let _first = changes.subscribe(move || count_clone.set(count_clone.get() + 1));
        let count_clone = count.clone();
        let _second = changes.subscribe(move || count_clone.set(count_clone.get() + 1));

        changes.publish(&"one");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn keyed_entry_pruned_after_last_unsubscribe() {
        let changes: Notifier<&str> = Notifier::new();
        let (_, observer) = counter();

        let sub = changes.subscribe_key("one", observer);
        assert_eq!(changes.inner.keyed.borrow().len(), 1);

        sub.unsubscribe();
        assert_eq!(changes.inner.keyed.borrow().len(), 0);
    }

    // =========================================================================
    // BATCH
    // =========================================================================

    #[test]
    fn batch_collapses_repeated_keys() {
        let changes: Notifier<&str> = Notifier::new();
        let (keyed_count, keyed_observer) = counter();
        let (global_count, global_observer) = counter();

        let _keyed = changes.subscribe_key("one", keyed_observer);
        let _global = changes.subscribe(global_observer);

        changes.batch(|| {
            changes.publish(&"one");
            changes.publish(&"one");
            changes.publish(&"two");
            assert_eq!(keyed_count.get(), 0);
            assert_eq!(global_count.get(), 0);
        });

        assert_eq!(keyed_count.get(), 1);
        assert_eq!(global_count.get(), 1);
    }

    #[test]
    fn batch_replays_in_first_publish_order() {
        let changes: Notifier<&str> = Notifier::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        for key in ["a", "b", "c"] {
            let order_clone = order.clone();
            let _sub = changes.subscribe_key(key, move || order_clone.borrow_mut().push(key));
        }

        changes.batch(|| {
            changes.publish(&"b");
            changes.publish(&"a");
            changes.publish(&"b");
            changes.publish(&"c");
        });

        assert_eq!(*order.borrow(), vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_batch_still_fires_global() {
        let changes: Notifier<&str> = Notifier::new();
        let (global_count, global_observer) = counter();
        let _global = changes.subscribe(global_observer);

        changes.batch(|| {});
        assert_eq!(global_count.get(), 1);
    }

    #[test]
    fn publish_all_inside_batch_is_dropped() {
        let changes: Notifier<&str> = Notifier::new();
        let (global_count, global_observer) = counter();
        let _global = changes.subscribe(global_observer);

        changes.batch(|| {
            changes.publish_all();
            changes.publish_all();
        });

        // Only the end-of-batch delivery, not one per bulk publish.
        assert_eq!(global_count.get(), 1);
    }

    #[test]
    fn batch_returns_body_result() {
        let changes: Notifier<&str> = Notifier::new();
        assert_eq!(changes.batch(|| 42), 42);
        assert_eq!(changes.batch(|| String::from("hello")), "hello");
    }

    #[test]
    fn is_batching_flag() {
        let changes: Notifier<&str> = Notifier::new();
        assert!(!changes.is_batching());
        changes.batch(|| assert!(changes.is_batching()));
        assert!(!changes.is_batching());
    }

    #[test]
    fn batch_panic_releases_scope() {
        let changes: Notifier<&str> = Notifier::new();
        let (count, observer) = counter();
        let _sub = changes.subscribe_key("one", observer);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            changes.batch(|| {
                changes.publish(&"one");
                panic!("intentional panic");
            });
        }));
        assert!(result.is_err());

        // Scope released, queue discarded, engine still usable.
        assert!(!changes.is_batching());
        assert_eq!(count.get(), 0);

        changes.publish(&"one");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn nested_batch_clobbers_outer_queue() {
        let changes: Notifier<&str> = Notifier::new();
        let (keyed_count, keyed_observer) = counter();
        let (global_count, global_observer) = counter();

        let _keyed = changes.subscribe_key("outer", keyed_observer);
        let _global = changes.subscribe(global_observer);

        changes.batch(|| {
            changes.publish(&"outer");
            changes.batch(|| {});
            // The inner scope discarded the queue and already closed.
            assert!(!changes.is_batching());
        });

        // "outer" was lost to the clobber; each scope exit fired global once.
        assert_eq!(keyed_count.get(), 0);
        assert_eq!(global_count.get(), 2);
    }

    // =========================================================================
    // SUSPEND
    // =========================================================================

    #[test]
    fn suspend_drops_publishes() {
        let changes: Notifier<&str> = Notifier::new();
        let (keyed_count, keyed_observer) = counter();
        let (global_count, global_observer) = counter();

        let _keyed = changes.subscribe_key("one", keyed_observer);
        let _global = changes.subscribe(global_observer);

        changes.suspend(|| {
            changes.publish(&"one");
            changes.publish_all();
        });

        // No replay after the scope either.
        assert_eq!(keyed_count.get(), 0);
        assert_eq!(global_count.get(), 0);
    }

    #[test]
    fn suspend_returns_body_result() {
        let changes: Notifier<&str> = Notifier::new();
        assert_eq!(changes.suspend(|| 7), 7);
    }

    #[test]
    fn nested_suspend_restores_outer_scope() {
        let changes: Notifier<&str> = Notifier::new();

        changes.suspend(|| {
            changes.suspend(|| assert!(changes.is_suspended()));
            // Inner exit must not clear the outer scope.
            assert!(changes.is_suspended());
        });
        assert!(!changes.is_suspended());
    }

    #[test]
    fn suspend_panic_restores_flag() {
        let changes: Notifier<&str> = Notifier::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            changes.suspend(|| panic!("intentional panic"));
        }));
        assert!(result.is_err());
        assert!(!changes.is_suspended());
    }

    #[test]
    fn suspension_wins_inside_batch() {
        let changes: Notifier<&str> = Notifier::new();
        let (keyed_count, keyed_observer) = counter();
        let _keyed = changes.subscribe_key("one", keyed_observer);

        changes.batch(|| {
            changes.suspend(|| changes.publish(&"one"));
        });

        // The suspended publish never reached the batch queue.
        assert_eq!(keyed_count.get(), 0);
    }

    // =========================================================================
    // RE-ENTRANCY
    // =========================================================================

    #[test]
    fn observer_may_subscribe_mid_delivery() {
        let changes: Notifier<&str> = Notifier::new();
        let count = Rc::new(Cell::new(0));

        let changes_clone = changes.clone();
        let count_clone = count.clone();
        let _sub = changes.subscribe(move || {
            let count_inner = count_clone.clone();
            let _late = changes_clone.subscribe(move || count_inner.set(count_inner.get() + 1));
        });

        changes.publish_all();
        // The late observer was not in the in-flight snapshot.
        assert_eq!(count.get(), 0);

        changes.publish_all();
        // Now it is (the first delivery added one more).
        assert!(count.get() >= 1);
    }

    #[test]
    fn observer_may_unsubscribe_itself_mid_delivery() {
        let changes: Notifier<&str> = Notifier::new();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let count_clone = count.clone();
        let slot_clone = slot.clone();
        let sub = changes.subscribe(move || {
            count_clone.set(count_clone.get() + 1);
            if let Some(sub) = slot_clone.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(sub);

        changes.publish_all();
        changes.publish_all();
        assert_eq!(count.get(), 1);
    }
}
