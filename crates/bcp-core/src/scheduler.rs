//! Auto-refresh timer.
//!
//! One background thread per enabled scheduler delivers epoch-tagged ticks
//! at a fixed cadence. Deadlines are absolute, so a slow consumer does not
//! accumulate drift. `disable` joins the worker before returning, and the
//! epoch tag lets the engine discard ticks that were already queued when
//! the timer was torn down.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bcp_common::Result;
use tracing::debug;

/// Callback invoked on every tick with the epoch the timer was armed under.
pub type TickFn = Arc<dyn Fn(u64) + Send + Sync>;

struct TimerWorker {
    stop: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

/// Periodic tick source with exactly-one-timer semantics.
///
/// Re-arming (enable while enabled, or a cadence change) tears the old
/// timer down before the new one starts, so at most one timer thread is
/// ever alive. Every teardown bumps the epoch; the engine side rejects
/// ticks bearing an older epoch.
pub struct RefreshScheduler {
    deliver: TickFn,
    epoch: u64,
    worker: Option<TimerWorker>,
}

impl RefreshScheduler {
    pub fn new(deliver: impl Fn(u64) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
            epoch: 0,
            worker: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.worker.is_some()
    }

    /// Epoch of the currently armed timer.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a tick bearing `epoch` came from the live timer.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.worker.is_some() && epoch == self.epoch
    }

    /// Arm the timer at `interval`, tearing down any previous timer first.
    /// Returns the epoch the new timer delivers under.
    pub fn enable(&mut self, interval: Duration) -> Result<u64> {
        self.disable();
        self.epoch += 1;
        let epoch = self.epoch;
        let deliver = Arc::clone(&self.deliver);
        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("bcp-refresh-timer".to_string())
            .spawn(move || timer_loop(interval, epoch, &deliver, &stop_rx))?;
        self.worker = Some(TimerWorker {
            stop: stop_tx,
            thread,
        });
        debug!(epoch, interval_ms = interval.as_millis() as u64, "refresh timer armed");
        Ok(epoch)
    }

    /// Tear the timer down and join it. No tick is delivered after this
    /// returns; ticks already queued carry a stale epoch.
    pub fn disable(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            let _ = worker.thread.join();
            self.epoch += 1;
            debug!(epoch = self.epoch, "refresh timer disarmed");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.disable();
    }
}

/// Deadline loop: waits out each interval on the stop channel so a stop
/// signal interrupts the sleep immediately.
fn timer_loop(interval: Duration, epoch: u64, deliver: &TickFn, stop: &mpsc::Receiver<()>) {
    let mut next = Instant::now() + interval;
    loop {
        let wait = next.saturating_duration_since(Instant::now());
        match stop.recv_timeout(wait) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => return,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                deliver(epoch);
                next += interval;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn collecting() -> (Arc<Mutex<Vec<u64>>>, RefreshScheduler) {
        let ticks: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        let scheduler = RefreshScheduler::new(move |epoch| {
            sink.lock().unwrap().push(epoch);
        });
        (ticks, scheduler)
    }

    #[test]
    fn delivers_ticks_at_the_cadence() {
        let (ticks, mut scheduler) = collecting();
        let epoch = scheduler.enable(Duration::from_millis(10)).unwrap();
        thread::sleep(Duration::from_millis(55));
        scheduler.disable();
        let seen = ticks.lock().unwrap().clone();
        assert!(seen.len() >= 3, "expected >= 3 ticks, got {}", seen.len());
        assert!(seen.iter().all(|e| *e == epoch));
    }

    #[test]
    fn disable_stops_delivery() {
        let (ticks, mut scheduler) = collecting();
        scheduler.enable(Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(20));
        scheduler.disable();
        let at_disable = ticks.lock().unwrap().len();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.lock().unwrap().len(), at_disable);
        assert!(!scheduler.is_enabled());
    }

    #[test]
    fn rearm_bumps_the_epoch_and_keeps_one_timer() {
        let (ticks, mut scheduler) = collecting();
        let first = scheduler.enable(Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(20));
        let second = scheduler.enable(Duration::from_millis(5)).unwrap();
        assert!(second > first);
        thread::sleep(Duration::from_millis(30));
        scheduler.disable();

        let seen = ticks.lock().unwrap().clone();
        // the old timer was joined before the new epoch existed, so epochs
        // never interleave
        let boundary = seen.iter().position(|e| *e == second).unwrap();
        assert!(seen[..boundary].iter().all(|e| *e == first));
        assert!(seen[boundary..].iter().all(|e| *e == second));
    }

    #[test]
    fn stale_epochs_are_rejected() {
        let (_ticks, mut scheduler) = collecting();
        let first = scheduler.enable(Duration::from_millis(50)).unwrap();
        assert!(scheduler.accepts(first));
        let second = scheduler.enable(Duration::from_millis(50)).unwrap();
        assert!(!scheduler.accepts(first));
        assert!(scheduler.accepts(second));
        scheduler.disable();
        assert!(!scheduler.accepts(second));
    }

    #[test]
    fn disable_without_enable_is_a_no_op() {
        let (ticks, mut scheduler) = collecting();
        scheduler.disable();
        scheduler.disable();
        assert!(ticks.lock().unwrap().is_empty());
        assert_eq!(scheduler.epoch(), 0);
    }
}
