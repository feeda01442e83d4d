//! # Batch Scheduler
//!
//! A dedicated thread that calls [`DetectionEngine::run_batch_scan`] every
//! `general.check_interval_ms`. The interval is re-read each tick, so a
//! reload takes effect on the next wait.
//!
//! Shutdown wakes the thread immediately instead of waiting out the tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::engine::DetectionEngine;
use crate::error::{EngineError, EngineResult};

/// Wake-up signal shared with the scan thread.
#[derive(Default)]
struct Wake {
    lock: Mutex<()>,
    condvar: Condvar,
}

/// Scan thread statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Completed scans.
    pub ticks: u64,
    /// Reports delivered by those scans.
    pub reports: u64,
}

/// Runs batch scans on a background thread until stopped or dropped.
pub struct BatchScheduler {
    /// Scan thread handle.
    handle: Option<JoinHandle<()>>,
    /// Shutdown signal.
    shutdown: Arc<AtomicBool>,
    /// Wakes the thread early.
    wake: Arc<Wake>,
    /// Completed scans.
    ticks: Arc<AtomicU64>,
    /// Reports delivered.
    reports: Arc<AtomicU64>,
}

impl BatchScheduler {
    /// Starts the scan thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the OS refuses a new thread.
    pub fn start(engine: Arc<DetectionEngine>) -> EngineResult<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Wake::default());
        let ticks = Arc::new(AtomicU64::new(0));
        let reports = Arc::new(AtomicU64::new(0));

        let thread_shutdown = Arc::clone(&shutdown);
        let thread_wake = Arc::clone(&wake);
        let thread_ticks = Arc::clone(&ticks);
        let thread_reports = Arc::clone(&reports);

        let handle = thread::Builder::new()
            .name("vigil-batch-scan".to_string())
            .spawn(move || {
                Self::scan_loop(&engine, &thread_shutdown, &thread_wake, &thread_ticks, &thread_reports);
            })
            .map_err(EngineError::Spawn)?;

        tracing::info!("batch scheduler started");

        Ok(Self {
            handle: Some(handle),
            shutdown,
            wake,
            ticks,
            reports,
        })
    }

    /// Scan thread main loop.
    fn scan_loop(
        engine: &DetectionEngine,
        shutdown: &AtomicBool,
        wake: &Wake,
        ticks: &AtomicU64,
        reports: &AtomicU64,
    ) {
        while !shutdown.load(Ordering::Acquire) {
            let interval = Duration::from_millis(engine.config().general.check_interval_ms);
            let deadline = Instant::now() + interval;

            {
                let mut guard = wake.lock.lock();
                while !shutdown.load(Ordering::Acquire) && Instant::now() < deadline {
                    wake.condvar.wait_until(&mut guard, deadline);
                }
            }

            if shutdown.load(Ordering::Acquire) || engine.is_stopped() {
                break;
            }

            let delivered = engine.run_batch_scan();
            ticks.fetch_add(1, Ordering::Relaxed);
            reports.fetch_add(delivered as u64, Ordering::Relaxed);
        }
    }

    /// Returns scan counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            reports: self.reports.load(Ordering::Relaxed),
        }
    }

    /// Stops the scan thread and waits for it to exit.
    pub fn stop(mut self) -> SchedulerStats {
        self.halt();
        self.stats()
    }

    fn halt(&mut self) {
        // Signal shutdown
        self.shutdown.store(true, Ordering::Release);

        // Wake the scan thread
        {
            let guard = self.wake.lock.lock();
            self.wake.condvar.notify_all();
            drop(guard);
        }

        // Wait for it to finish
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("batch scan thread panicked");
            }
            tracing::info!(ticks = self.ticks.load(Ordering::Relaxed), "batch scheduler stopped");
        }
    }
}

impl Drop for BatchScheduler {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::report::ChannelSink;

    fn engine_with_interval(ms: u64) -> Arc<DetectionEngine> {
        let mut config = EngineConfig::default();
        config.general.check_interval_ms = ms;
        let (sink, _rx) = ChannelSink::unbounded();
        Arc::new(DetectionEngine::new(config, sink))
    }

    #[test]
    fn test_ticks_and_stops() {
        let scheduler = BatchScheduler::start(engine_with_interval(50)).unwrap();
        thread::sleep(Duration::from_millis(400));
        let stats = scheduler.stop();
        assert!(stats.ticks >= 2, "only {} ticks", stats.ticks);
    }

    #[test]
    fn test_stop_is_prompt() {
        let scheduler = BatchScheduler::start(engine_with_interval(60_000)).unwrap();
        let started = Instant::now();
        let stats = scheduler.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(stats.ticks, 0);
    }

    #[test]
    fn test_exits_when_engine_stops() {
        let engine = engine_with_interval(50);
        let scheduler = BatchScheduler::start(Arc::clone(&engine)).unwrap();
        engine.shutdown();
        thread::sleep(Duration::from_millis(200));
        drop(scheduler);
    }
}
