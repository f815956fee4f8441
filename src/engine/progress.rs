// src/engine/progress.rs
// =============================================================================
// This module reports scan progress.
//
// Workers bump a shared counter once per finished entry. At most once per
// interval (and once more at the very end) the current count is handed to an
// observer, for example a terminal line showing "1234/5000".
//
// Progress is purely informational: nothing in the scan waits on it or
// depends on its ordering.
//
// Rust concepts:
// - AtomicUsize: A counter many threads can bump without a lock
// - Trait objects: Arc<dyn ProgressObserver> lets callers plug in any display
// =============================================================================

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Receives progress updates.
pub trait ProgressObserver: Send + Sync {
    fn update(&self, done: usize, total: usize);
}

/// Observer that ignores every update.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn update(&self, _done: usize, _total: usize) {}
}

/// Observer that redraws `done/total` on stderr.
pub struct TerminalProgress;

impl ProgressObserver for TerminalProgress {
    fn update(&self, done: usize, total: usize) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}/{}", done, total);
        if done >= total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

pub struct ProgressReporter {
    counter: AtomicUsize,
    total: usize,
    interval: Duration,
    last_report: Mutex<Option<Instant>>,
    observer: Arc<dyn ProgressObserver>,
}

impl ProgressReporter {
    pub fn new(total: usize, interval: Duration, observer: Arc<dyn ProgressObserver>) -> Self {
        ProgressReporter {
            counter: AtomicUsize::new(0),
            total,
            interval,
            last_report: Mutex::new(None),
            observer,
        }
    }

    /// Counts one finished entry, and notifies the observer if the interval
    /// since the last notification has elapsed.
    pub fn increment(&self) {
        let done = self.counter.fetch_add(1, Ordering::Relaxed) + 1;

        // Another worker is already reporting: skip rather than wait
        let Ok(mut last_report) = self.last_report.try_lock() else {
            return;
        };
        let now = Instant::now();
        if (*last_report).map_or(true, |last| now.duration_since(last) >= self.interval) {
            *last_report = Some(now);
            self.observer.update(done, self.total);
        }
    }

    /// Sends the final count, whatever the interval.
    pub fn finish(&self) {
        let _guard = self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.observer.update(self.done(), self.total);
    }

    pub fn done(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}
