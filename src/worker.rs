//! Reference worker loop
//!
//! Owns one `ShutdownSignal` and one `LifecycleTracker` and drains a work
//! channel until shutdown is requested or the source disconnects:
//!
//! ```text
//! run():  transition(Running)
//!         while !signal.is_requested():
//!             select(work item | request handle)
//!         transition(Stopped)
//! ```
//!
//! Other threads stop it with `request_shutdown` and synchronize on it with
//! `wait_for_state`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, select};

use crate::error::{LifecycleError, Result};
use crate::phase::Phase;
use crate::shutdown::ShutdownSignal;
use crate::tracker::LifecycleTracker;

/// Counters reported when a worker loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Work items handed to the handler
    pub processed: u64,
    /// The loop exited because every sender of the work channel was dropped
    pub source_closed: bool,
}

/// What one pass through the select produced
enum Step<T> {
    Item(T),
    SourceClosed,
    ShutdownNotified,
}

/// A worker main loop over a crossbeam work channel
pub struct Worker<T> {
    name: String,
    work: Receiver<T>,
    signal: Arc<ShutdownSignal>,
    tracker: Arc<LifecycleTracker<Phase>>,
}

impl<T> Worker<T> {
    /// Create a worker in the `New` phase
    pub fn new(name: impl Into<String>, work: Receiver<T>) -> Self {
        Self {
            name: name.into(),
            work,
            signal: Arc::new(ShutdownSignal::new()),
            tracker: Arc::new(LifecycleTracker::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signal(&self) -> &Arc<ShutdownSignal> {
        &self.signal
    }

    pub fn tracker(&self) -> &Arc<LifecycleTracker<Phase>> {
        &self.tracker
    }

    /// Run the loop on the calling thread until it stops
    pub fn run<F>(&self, mut handler: F) -> WorkerStats
    where
        F: FnMut(T),
    {
        self.tracker.transition(Phase::Running);
        tracing::info!(worker = %self.name, "Worker running");

        let mut stats = WorkerStats::default();
        while !self.signal.is_requested() {
            let step = select! {
                recv(self.work) -> item => match item {
                    Ok(item) => Step::Item(item),
                    Err(_) => Step::SourceClosed,
                },
                recv(self.signal.request_handle()) -> _ => Step::ShutdownNotified,
            };

            match step {
                Step::Item(item) => {
                    handler(item);
                    stats.processed += 1;
                }
                Step::SourceClosed => {
                    tracing::warn!(worker = %self.name, "Work source disconnected");
                    stats.source_closed = true;
                    break;
                }
                // The flag is already set; the loop condition ends the loop.
                Step::ShutdownNotified => {}
            }
        }

        self.tracker.transition(Phase::Stopped);
        tracing::info!(
            worker = %self.name,
            processed = stats.processed,
            source_closed = stats.source_closed,
            "Worker stopped"
        );
        stats
    }

    /// Run the loop on a dedicated thread named after the worker
    pub fn spawn<F>(self, handler: F) -> Result<WorkerHandle>
    where
        T: Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let signal = Arc::clone(&self.signal);
        let tracker = Arc::clone(&self.tracker);
        let thread = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || self.run(handler))?;

        Ok(WorkerHandle {
            signal,
            tracker,
            thread,
        })
    }
}

/// Handle to a worker running on its own thread
#[derive(Debug)]
pub struct WorkerHandle {
    signal: Arc<ShutdownSignal>,
    tracker: Arc<LifecycleTracker<Phase>>,
    thread: JoinHandle<WorkerStats>,
}

impl WorkerHandle {
    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    pub fn tracker(&self) -> &LifecycleTracker<Phase> {
        &self.tracker
    }

    /// Current phase of the worker
    pub fn phase(&self) -> Phase {
        self.tracker.state()
    }

    /// Block until the worker has entered its main loop
    pub fn wait_until_running(&self) -> Phase {
        self.tracker.wait_for_state(Phase::Running)
    }

    /// Request shutdown and wait for the worker thread to finish
    pub fn shutdown(self) -> Result<WorkerStats> {
        self.signal.request_shutdown();
        self.join()
    }

    /// Wait for the worker thread to finish without requesting shutdown
    pub fn join(self) -> Result<WorkerStats> {
        self.thread.join().map_err(|_| LifecycleError::WorkerPanicked)
    }
}
