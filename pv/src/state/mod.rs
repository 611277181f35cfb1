//! State management with actor pattern
//!
//! StateManager owns the single AppState of a session and processes
//! commands from a channel, so timer-driven refreshes and user edits are
//! applied one at a time. Every mutation commits in memory, then persists,
//! then publishes a `StateEvent`.
//!
//! A failed write does not roll the mutation back: the change stays in
//! memory, a `PersistFailed` event and a warning toast are emitted, and the
//! next successful write carries it to disk.

mod manager;
mod messages;

pub use manager::{ManagerOptions, StateManager};
pub use messages::{InitReport, StateCommand, StateError, StateResponse};
