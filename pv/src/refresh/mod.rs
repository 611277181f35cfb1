//! RefreshScheduler - background catalog refresh
//!
//! A periodic timer asks whether the catalog is stale and, if it is, fetches
//! a fresh copy and hands it to the StateManager. User annotations survive the
//! swap; a failed fetch leaves the catalog untouched and is only logged.
//!
//! ```text
//!   start()        tick (due)              refresh body done
//! Stopped ──► Idle ─────────────► Refreshing ─────────────► Idle
//!    ▲                                                        │
//!    └──────────────────────── stop() ────────────────────────┘
//! ```
//!
//! At most one refresh body runs at a time. A tick that finds one in flight
//! is skipped, never queued.

mod flight;
mod scheduler;

pub use flight::{FlightGuard, SingleFlight};
pub use scheduler::{RefreshConfig, RefreshScheduler, SchedulerPhase, TickOutcome};
