// ============================================================================
// pulse-state - Reactive Container Wrappers for Rust
// ============================================================================
//
// Maps, sets, and keyed records whose mutations automatically notify
// interested observers - per-key or globally, immediately, collapsed into
// a batch, or dropped under suspension.
//
// In-process, single-thread-of-control state only: every delivery happens
// synchronously on the mutating caller's stack, and nothing here is Send.
// ============================================================================

pub mod collections;
pub mod notify;

mod macros;

// Re-export the engine surface at crate root for ergonomic access
pub use notify::{batch, subscribe, subscribe_key, suspend, Notifier, Observable, Observer, Subscription};

// Re-export collections
pub use collections::{ReactiveMap, ReactiveRecord, ReactiveSet};

// =============================================================================
// TESTS
// =============================================================================
