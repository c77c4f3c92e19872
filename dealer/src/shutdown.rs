use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

/// The terminate flag shared by the dealer, the players and the generators.
///
/// Besides the flag, it holds a channel on which nothing is ever sent. Its
/// sender is dropped on termination, which wakes every thread blocked on
/// [`signal()`](Self::signal) in a `select!` or in [`sleep_until()`](Self::sleep_until).
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
    signal: Receiver<()>,
}

struct Inner {
    triggered: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
            }),
            signal: rx,
        }
    }

    /// Idempotent.
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.trigger.lock().take();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Becomes ready (disconnected) once the shutdown is triggered.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }

    /// Returns true if woken up by the shutdown rather than the deadline.
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        match self.signal.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn trigger_wakes_sleepers() {
        let shutdown = Shutdown::new();
        let sleeper = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || shutdown.sleep_until(Instant::now() + Duration::from_secs(60)))
        };
        std::thread::sleep(Duration::from_millis(20));
        shutdown.trigger();
        assert!(sleeper.join().unwrap());
        assert!(shutdown.is_triggered());
        // Triggering twice is fine
        shutdown.trigger();
    }

    #[test]
    fn deadline_passes_without_trigger() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.sleep_until(Instant::now() + Duration::from_millis(5)));
        assert!(!shutdown.is_triggered());
    }
}
