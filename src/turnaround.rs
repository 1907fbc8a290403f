use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Half-duplex turn-taking coordinator.
///
/// The transmit path sets suppression before the first tone and asks for it
/// to be released after the sink drains; the receive path polls
/// `is_suppressed` per sample and discards everything while it holds.
/// Clones share one flag.
///
/// Release is guarded: clearing the flag is deferred by the guard interval
/// so residual self-generated audio still in the capture path drains before
/// reception resumes. Each `begin_sending` bumps an epoch, and a pending
/// guard timer only clears the flag if its epoch is still current — a new
/// transmission can never be unmasked by a stale timer.
#[derive(Clone)]
pub struct Turnaround {
    inner: Arc<Inner>,
}

struct Inner {
    suppressed: AtomicBool,
    epoch: AtomicU64,
    guard: Duration,
}

impl Turnaround {
    pub fn new(guard: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                suppressed: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                guard,
            }),
        }
    }

    /// True while the receive path must discard input.
    pub fn is_suppressed(&self) -> bool {
        self.inner.suppressed.load(Ordering::SeqCst)
    }

    /// Transmission is starting: suppress reception immediately and cancel
    /// any guard timer still pending from the previous transmission.
    pub fn begin_sending(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.suppressed.store(true, Ordering::SeqCst);
    }

    /// Transmission has stopped and the output buffer has drained: release
    /// suppression after the guard interval.
    pub fn end_sending(&self) {
        if self.inner.guard.is_zero() {
            self.inner.suppressed.store(false, Ordering::SeqCst);
            return;
        }

        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            thread::sleep(inner.guard);
            if inner.epoch.load(Ordering::SeqCst) == epoch {
                inner.suppressed.store(false, Ordering::SeqCst);
                log::debug!("receive guard interval elapsed, reception enabled");
            }
        });
    }
}
