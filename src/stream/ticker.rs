use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::debug;
pub type Task = Box<dyn FnMut() + Send + 'static>;
/// Anything that can invoke a zero-argument callback at a fixed interval.
pub trait Ticker {
    fn schedule(&mut self, period: Duration, task: Task);
    /// Stops every scheduled task. Tasks never run after this returns.
    fn stop(&mut self);
}
/// One background thread per scheduled task.
#[derive(Default)]
pub struct ThreadTicker {
    workers: Vec<(Sender<()>, JoinHandle<()>)>,
}
impl ThreadTicker {
    pub fn new() -> Self {
        Self::default()
    }
}
impl Ticker for ThreadTicker {
    fn schedule(&mut self, period: Duration, mut task: Task) {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => task(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        self.workers.push((stop_tx, handle));
    }
    fn stop(&mut self) {
        for (stop_tx, handle) in self.workers.drain(..) {
            stop_tx.send(()).ok();
            if handle.join().is_err() {
                debug!("ticker task panicked before shutdown");
            }
        }
    }
}
impl Drop for ThreadTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
struct ManualEntry {
    period: Duration,
    next_due: Duration,
    task: Task,
}
/// Test clock: tasks fire only inside `advance`, in due-time order.
#[derive(Default)]
pub struct ManualTicker {
    now: Duration,
    entries: Vec<ManualEntry>,
}
impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn now(&self) -> Duration {
        self.now
    }
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        loop {
            let due = self
                .entries
                .iter_mut()
                .filter(|entry| entry.next_due <= target)
                .min_by_key(|entry| entry.next_due);
            let Some(entry) = due else {
                break;
            };
            self.now = entry.next_due;
            entry.next_due += entry.period;
            (entry.task)();
        }
        self.now = target;
    }
}
impl Ticker for ManualTicker {
    fn schedule(&mut self, period: Duration, task: Task) {
        let period = period.max(Duration::from_nanos(1));
        self.entries.push(ManualEntry {
            period,
            next_due: self.now + period,
            task,
        });
    }
    fn stop(&mut self) {
        self.entries.clear();
    }
}
