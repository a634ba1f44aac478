// ============================================================================
// pulse-state - Notification Engine
// Subscriber registries and the immediate / batched / suspended policies
// ============================================================================
//
// One Notifier per container. Mutations reach observers through publish,
// and the engine's current mode decides what happens:
//
// 1. Immediate (default): keyed observers run, then global observers,
//    synchronously on the mutating caller's stack
// 2. Batched: keys queue up (once each) and replay at scope end, followed
//    by a single unconditional global delivery
// 3. Suspended: publishes are dropped, permanently - no replay
// ============================================================================

mod hub;
mod observable;
mod subscription;

pub use hub::Notifier;
pub use observable::{batch, subscribe, subscribe_key, suspend, Observable};
pub use subscription::{Observer, Subscription};
