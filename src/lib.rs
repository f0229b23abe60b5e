//! lifecycle - Shutdown signalling and phase tracking for worker loops
//!
//! Two independent primitives:
//! - [`ShutdownSignal`]: one-shot, idempotent stop request with a pollable flag,
//!   a single-delivery handle for select loops, and wake-all waits.
//! - [`LifecycleTracker`]: current phase plus blocking waits for an exact phase.
//!
//! [`Worker`] shows them composed into a main loop.

pub mod error;
pub mod phase;
pub mod shutdown;
pub mod tracker;
pub mod worker;

pub use error::{LifecycleError, Result};
pub use phase::{ForwardOnly, Phase, TransitionPolicy};
pub use shutdown::ShutdownSignal;
pub use tracker::LifecycleTracker;
pub use worker::{Worker, WorkerHandle, WorkerStats};
