//! Error types for lifecycle
//!
//! Centralized error handling using thiserror. The shutdown signal and the
//! unconditional tracker operations never fail; these variants cover the
//! opt-in validation path and the reference worker.

use thiserror::Error;

/// All error types that can occur in lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A transition policy rejected the requested edge
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// A phase label could not be parsed
    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    /// The worker thread panicked before reporting its stats
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
