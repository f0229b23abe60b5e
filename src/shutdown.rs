//! One-shot shutdown signal for worker main loops
//!
//! A plain "quit channel" in a select does not stop a worker promptly: if work
//! keeps arriving, the select may keep picking the work arm for many iterations.
//! `ShutdownSignal` pairs a pollable flag with a single-delivery handle, so a
//! loop shaped like
//!
//! ```no_run
//! # use crossbeam_channel::{select, unbounded};
//! # use lifecycle::ShutdownSignal;
//! # let signal = ShutdownSignal::new();
//! # let (_tx, work) = unbounded::<u32>();
//! while !signal.is_requested() {
//!     select! {
//!         recv(work) -> item => { let _ = item; }
//!         recv(signal.request_handle()) -> _ => {}
//!     }
//! }
//! ```
//!
//! runs at most one more iteration after `request_shutdown` returns.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;

/// Idempotent, broadcastable "stop now" notification
#[derive(Debug)]
pub struct ShutdownSignal {
    requested: AtomicBool,
    // Held for the signal's lifetime so handle receivers block instead of
    // observing a disconnect.
    tx: Sender<()>,
    rx: Receiver<()>,
    gate: Mutex<()>,
    released: Condvar,
    notify: Notify,
}

impl ShutdownSignal {
    /// Create a signal that has not been requested
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            requested: AtomicBool::new(false),
            tx,
            rx,
            gate: Mutex::new(()),
            released: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// True once any call to `request_shutdown` has completed its flag flip
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// The handle that becomes readable once shutdown is requested.
    ///
    /// Every call returns the same receiver. It carries a single value over the
    /// signal's lifetime, so only one thread should rely on receiving from it;
    /// use `wait` or `requested` to release many waiters.
    pub fn request_handle(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Request shutdown. Only the first call has any effect; later and
    /// concurrent calls return immediately.
    pub fn request_shutdown(&self) {
        if self
            .requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Shutdown already requested, ignoring");
            return;
        }

        log::info!("Shutdown requested");

        // Capacity is one and only the CAS winner sends, so this cannot fail
        // with Full; Disconnected is impossible while `self.rx` is alive.
        let _ = self.tx.try_send(());

        {
            let _guard = self.gate.lock();
            self.released.notify_all();
        }
        self.notify.notify_waiters();
    }

    /// Block the calling thread until shutdown has been requested
    pub fn wait(&self) {
        let mut guard = self.gate.lock();
        while !self.is_requested() {
            self.released.wait(&mut guard);
        }
    }

    /// Resolve once shutdown has been requested
    pub async fn requested(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a request racing with this call
        // still wakes us.
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_signal_not_requested() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_requested());
        assert!(signal.request_handle().try_recv().is_err());
    }

    #[test]
    fn test_request_sets_flag() {
        let signal = ShutdownSignal::new();
        signal.request_shutdown();
        assert!(signal.is_requested());
        signal.request_shutdown();
        assert!(signal.is_requested());
    }

    #[test]
    fn test_handle_delivers_exactly_once() {
        let signal = ShutdownSignal::new();
        signal.request_shutdown();
        signal.request_shutdown();
        signal.request_shutdown();

        assert!(signal.request_handle().try_recv().is_ok());
        assert!(signal.request_handle().try_recv().is_err());
        assert!(
            signal
                .request_handle()
                .recv_timeout(Duration::from_millis(50))
                .is_err()
        );
    }

    #[test]
    fn test_handle_is_stable() {
        let signal = ShutdownSignal::new();
        assert!(signal.request_handle().same_channel(signal.request_handle()));
    }

    #[test]
    fn test_handle_blocks_until_requested() {
        let signal = ShutdownSignal::new();
        assert!(
            signal
                .request_handle()
                .recv_timeout(Duration::from_millis(50))
                .is_err()
        );
        signal.request_shutdown();
        assert!(
            signal
                .request_handle()
                .recv_timeout(Duration::from_secs(1))
                .is_ok()
        );
    }

    #[test]
    fn test_concurrent_requests_never_block() {
        let signal = Arc::new(ShutdownSignal::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.request_shutdown())
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(signal.is_requested());
        assert_eq!(signal.request_handle().len(), 1);
    }

    #[test]
    fn test_wait_returns_immediately_when_requested() {
        let signal = ShutdownSignal::new();
        signal.request_shutdown();
        signal.wait();
    }

    #[test]
    fn test_wait_releases_every_waiter() {
        let signal = Arc::new(ShutdownSignal::new());
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        for _ in 0..4 {
            let signal = Arc::clone(&signal);
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                signal.wait();
                done_tx.send(()).unwrap();
            });
        }

        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        signal.request_shutdown();
        for _ in 0..4 {
            assert!(done_rx.recv_timeout(Duration::from_secs(1)).is_ok());
        }
    }

    #[tokio::test]
    async fn test_requested_resolves_after_request() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.requested().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        signal.request_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_requested_resolves_immediately_when_already_requested() {
        let signal = ShutdownSignal::new();
        signal.request_shutdown();
        tokio::time::timeout(Duration::from_millis(100), signal.requested())
            .await
            .expect("already requested");
    }
}
