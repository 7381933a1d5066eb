//! Periodic synchronization scheduler.
//!
//! One background thread drives all flush activity at a fixed cadence,
//! independent of event arrival. Each firing takes a snapshot of the live
//! sessions and flushes them one by one; a session whose previous flush is
//! still in flight is skipped rather than flushed concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::db::PersistentStore;
use crate::session::SessionRegistry;

/// Counters from one scheduler firing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sessions flushed this cycle.
    pub sessions_flushed: usize,
    /// Sessions skipped because a flush was already in flight.
    pub sessions_skipped: usize,
    /// Entries written to the store.
    pub synced: usize,
    /// Mergeable entries retained for retry.
    pub retained: usize,
    /// Point entries dropped after a failed push.
    pub dropped: usize,
}

/// Flush every live session once.
///
/// Works over a point-in-time snapshot: sessions connecting or disconnecting
/// during the pass are picked up on the next firing.
pub fn run_cycle(registry: &SessionRegistry, store: &dyn PersistentStore) -> CycleReport {
    let mut report = CycleReport::default();
    for session in registry.snapshot() {
        match session.flush(store) {
            Some(flush) => {
                report.sessions_flushed += 1;
                report.synced += flush.synced;
                report.retained += flush.retained;
                report.dropped += flush.dropped;
            }
            None => report.sessions_skipped += 1,
        }
    }
    report
}

/// Recurring background task flushing all sessions at a fixed interval.
///
/// Stopped explicitly via [`SyncScheduler::stop`] or implicitly on drop.
/// A single driver thread plus the per-session skip-if-busy guard means two
/// flush passes never run over the same session concurrently.
pub struct SyncScheduler {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Granularity of the shutdown check while sleeping between firings.
    const TICK: Duration = Duration::from_millis(25);

    /// Spawn the scheduler thread.
    pub fn start(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn PersistentStore>,
        interval: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || {
            tracing::info!("sync scheduler started, interval {:?}", interval);
            while flag.load(Ordering::SeqCst) {
                Self::sleep_interval(&flag, interval);
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let report = run_cycle(&registry, &*store);
                tracing::debug!(
                    "sync cycle: {} sessions, {} synced, {} retained, {} dropped",
                    report.sessions_flushed,
                    report.synced,
                    report.retained,
                    report.dropped
                );
            }
            tracing::info!("sync scheduler stopped");
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Sleep for the interval in short slices so stop() is prompt.
    fn sleep_interval(flag: &AtomicBool, interval: Duration) {
        let mut remaining = interval;
        while flag.load(Ordering::SeqCst) && !remaining.is_zero() {
            let slice = remaining.min(Self::TICK);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }

    /// Signal the scheduler to stop and wait for the thread to finish.
    ///
    /// A cycle in progress runs to completion; nothing is cancelled
    /// mid-flight.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("sync scheduler thread panicked");
            }
        }
    }

    /// Whether the scheduler thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
