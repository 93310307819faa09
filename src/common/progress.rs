//! Monotonic integer-percent progress for a single upload.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// Tracks bytes handed to the wire for one transfer.
///
/// Percent is `round(sent * 100 / total)`, never decreases within one
/// transfer, and reports 100 only after `complete()`. Consumers either poll
/// `percent()` or subscribe to the watch channel.
pub struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    done: AtomicBool,
    floor: AtomicU64,
    tx: watch::Sender<u8>,
}

impl ProgressTracker {
    /// Create a tracker for a transfer of `total_bytes`.
    pub fn new(total_bytes: u64) -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            total: total_bytes,
            sent: AtomicU64::new(0),
            done: AtomicBool::new(false),
            floor: AtomicU64::new(0),
            tx,
        }
    }

    /// Record bytes handed to the transport.
    pub fn record(&self, bytes: u64) {
        self.sent.fetch_add(bytes, Ordering::Relaxed);
        self.publish();
    }

    /// Mark the transfer finished; percent becomes 100.
    /// Idempotent — repeated calls are no-ops.
    pub fn complete(&self) {
        self.sent.store(self.total, Ordering::Relaxed);
        self.done.store(true, Ordering::Release);
        self.publish();
    }

    /// Current integer percent, 0-100. 100 is reserved for completion, so a
    /// rounded 100 mid-transfer reads as 99.
    pub fn percent(&self) -> u8 {
        let raw = if self.done.load(Ordering::Acquire) {
            100
        } else if self.total == 0 {
            0
        } else {
            let sent = self.sent.load(Ordering::Relaxed).min(self.total);
            let rounded = (sent * 100 + self.total / 2) / self.total;
            rounded.min(99)
        };

        // Never report less than an earlier reading
        let previous = self.floor.fetch_max(raw, Ordering::AcqRel);
        previous.max(raw) as u8
    }

    /// Subscribe to percent changes.
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        let percent = self.percent();
        self.tx.send_if_modified(|current| {
            if *current != percent {
                *current = percent;
                true
            } else {
                false
            }
        });
    }
}
