//! Shared helpers for integration tests.

use std::sync::Once;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};

static LOGGING: Once = Once::new();

/// Route library logs to the test harness once per test binary.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    });
}

/// Run a blocking call on its own thread and hand back a receiver for its
/// result, so the test can bound how long it waits.
pub fn on_thread<T, F>(f: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx
}

#[allow(dead_code)]
pub const SETTLE: Duration = Duration::from_millis(100);

#[allow(dead_code)]
pub const PROMPT: Duration = Duration::from_secs(1);
