//! Poll scheduler - background thread that runs one cycle at a time.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Background scheduler with at most one cycle in flight.
///
/// The next cycle is armed only after the current one returns, and waits
/// `interval` from that point. A panicking cycle is logged and the loop
/// carries on.
pub struct PollScheduler {
    running: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            handle: None,
        }
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start running `task` every `interval`. The first cycle runs immediately.
    ///
    /// Starting an already running scheduler has no effect.
    pub fn start<F>(&mut self, interval: Duration, task: F)
    where
        F: FnMut() + Send + 'static,
    {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("PollScheduler already running");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name("kiosk-monitor".into())
            .spawn(move || run_loop(interval, task, &running, &stop_rx));

        match handle {
            Ok(handle) => {
                self.stop_tx = Some(stop_tx);
                self.handle = Some(handle);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn poll thread");
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Stop the scheduler.
    ///
    /// A cycle already in progress runs to completion; none starts after this
    /// returns. Stopping a stopped scheduler has no effect.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_tx.take() {
            // Wakes the worker out of its inter-cycle wait
            let _ = stop_tx.try_send(());
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("poll thread terminated abnormally");
            }
        }
    }

    /// Check if the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<F>(interval: Duration, mut task: F, running: &AtomicBool, stop_rx: &Receiver<()>)
where
    F: FnMut(),
{
    tracing::info!("PollScheduler started with interval {:?}", interval);

    while running.load(Ordering::SeqCst) {
        if catch_unwind(AssertUnwindSafe(&mut task)).is_err() {
            tracing::error!("poll cycle panicked, continuing with next cycle");
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!("PollScheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn test_scheduler_lifecycle() {
        let mut scheduler = PollScheduler::new();
        assert!(!scheduler.is_running());

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = Arc::clone(&call_count);

        scheduler.start(Duration::from_millis(20), move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_running());

        // Wait for a few polls
        std::thread::sleep(Duration::from_millis(200));

        scheduler.stop();
        assert!(!scheduler.is_running());

        let after_stop = call_count.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected several cycles, got {after_stop}");

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(call_count.load(Ordering::SeqCst), after_stop);

        // Stopping twice is harmless
        scheduler.stop();
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut scheduler = PollScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_clone = Arc::clone(&first);
        scheduler.start(Duration::from_millis(20), move || {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        let second_clone = Arc::clone(&second);
        scheduler.start(Duration::from_millis(20), move || {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        assert!(first.load(Ordering::SeqCst) >= 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_cycle_does_not_stop_loop() {
        let mut scheduler = PollScheduler::new();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = Arc::clone(&call_count);

        scheduler.start(Duration::from_millis(10), move || {
            let n = call_count_clone.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                panic!("platform binding blew up");
            }
        });

        std::thread::sleep(Duration::from_millis(150));
        scheduler.stop();

        assert!(call_count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_cancels_pending_wait() {
        let mut scheduler = PollScheduler::new();
        scheduler.start(Duration::from_secs(30), || {});
        std::thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        scheduler.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_restart_after_stop() {
        let mut scheduler = PollScheduler::new();
        let call_count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let call_count_clone = Arc::clone(&call_count);
            scheduler.start(Duration::from_millis(10), move || {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            });
            assert!(scheduler.is_running());
            std::thread::sleep(Duration::from_millis(50));
            scheduler.stop();
            assert!(!scheduler.is_running());
        }

        assert!(call_count.load(Ordering::SeqCst) >= 2);
    }
}
