//! StateNotifier - change notification for state consumers
//!
//! Every committed mutation publishes one `StateEvent`. Consumers either
//! register a synchronous handler (`subscribe` / `unsubscribe`) or take a
//! broadcast receiver for async consumption (`receiver`).
//!
//! # Delivery
//!
//! ```text
//!   StateManager actor ──publish(event)──┐
//!                                        ├─► handler 1 (sync, panic-isolated)
//!                                        ├─► handler 2
//!                                        └─► broadcast channel ─► async receivers
//! ```
//!
//! Publishing never waits on subscribers. A panicking handler is logged and
//! skipped; the remaining handlers still run.

mod notifier;
mod types;

pub use notifier::{DEFAULT_CHANNEL_CAPACITY, StateNotifier, SubscriptionId};
pub use types::StateEvent;
