use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use log::{error, info, warn};
use crate::stream::sink::{Artifact, BatchSink, SaveReport};
use crate::stream::{AccumulationBuffer, Batch, StreamError, Ticker};
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavePolicy {
    pub save_every: Duration,
    pub min_points: usize,
}
impl Default for SavePolicy {
    fn default() -> Self {
        Self {
            save_every: Duration::from_secs(5),
            min_points: 30,
        }
    }
}
/// Result of handing a batch to the sink. Fatal sink errors travel as `Err`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Table and chart written (the chart may be the fallback format).
    Saved(SaveReport),
    /// Table written, both chart renderers failed.
    Partial(SaveReport),
    NothingToSave,
}
impl FlushOutcome {
    pub fn report(&self) -> Option<&SaveReport> {
        match self {
            FlushOutcome::Saved(report) | FlushOutcome::Partial(report) => Some(report),
            FlushOutcome::NothingToSave => None,
        }
    }
    pub fn samples(&self) -> usize {
        self.report().map_or(0, |r| r.samples)
    }
}
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
impl fmt::Display for FlushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushOutcome::NothingToSave => f.write_str("No data buffered yet"),
            FlushOutcome::Saved(report) => {
                let table = file_name(&report.tabular_path);
                match &report.artifact {
                    Artifact::Fallback { file, .. } => write!(
                        f,
                        "Saved {} samples: {table} + {} ({} fallback)",
                        report.samples,
                        file_name(&file.path),
                        file.format
                    ),
                    artifact => match artifact.file() {
                        Some(file) => write!(
                            f,
                            "Saved {} samples: {table} + {}",
                            report.samples,
                            file_name(&file.path)
                        ),
                        None => write!(f, "Saved {} samples: {table}", report.samples),
                    },
                }
            }
            FlushOutcome::Partial(report) => {
                write!(
                    f,
                    "Saved {} samples: {} (chart failed",
                    report.samples,
                    file_name(&report.tabular_path)
                )?;
                if let Artifact::Missing { fallback_error, .. } = &report.artifact {
                    write!(f, ": {fallback_error}")?;
                }
                f.write_str(")")
            }
        }
    }
}
/// Status text for any flush result, including fatal ones.
pub fn status_line(result: &Result<FlushOutcome, StreamError>) -> String {
    match result {
        Ok(outcome) => outcome.to_string(),
        Err(err) => format!("Save failed: {err}"),
    }
}
/// What a timer tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped { pending: usize },
    Flushed(FlushOutcome),
}
/// Drains the accumulation buffer into a sink on a timer or on demand.
pub struct AutosaveScheduler {
    buffer: Arc<AccumulationBuffer>,
    sink: Arc<dyn BatchSink>,
    policy: SavePolicy,
}
impl AutosaveScheduler {
    pub fn new(
        buffer: Arc<AccumulationBuffer>,
        sink: Arc<dyn BatchSink>,
        policy: SavePolicy,
    ) -> Self {
        Self {
            buffer,
            sink,
            policy,
        }
    }
    pub fn policy(&self) -> SavePolicy {
        self.policy
    }
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
    pub fn buffer_status(&self) -> String {
        format!("Buffered: {} samples", self.pending())
    }
    /// Timer trigger: flushes only when `min_points` are waiting.
    pub fn on_tick(&self) -> Result<TickOutcome, StreamError> {
        match self.buffer.drain_at_least(self.policy.min_points.max(1)) {
            Ok(batch) => self.flush(batch).map(TickOutcome::Flushed),
            Err(pending) => {
                info!(
                    "[save] skipped: only {pending} buffered (< {})",
                    self.policy.min_points
                );
                Ok(TickOutcome::Skipped { pending })
            }
        }
    }
    /// Manual trigger: flushes whatever is buffered.
    pub fn force_flush(&self) -> Result<FlushOutcome, StreamError> {
        self.flush(self.buffer.drain())
    }
    /// Final best-effort flush on normal termination.
    pub fn shutdown(&self) -> Result<FlushOutcome, StreamError> {
        let result = self.force_flush();
        match &result {
            Ok(FlushOutcome::NothingToSave) => info!("[save] nothing pending at shutdown"),
            Ok(outcome) => info!("[save] final flush: {outcome}"),
            Err(err) => error!("[save] final flush failed: {err}"),
        }
        result
    }
    /// Hands an owned batch to the sink. No lock is held here.
    pub fn flush(&self, batch: Batch) -> Result<FlushOutcome, StreamError> {
        if batch.is_empty() {
            return Ok(FlushOutcome::NothingToSave);
        }
        let count = batch.len();
        let report = match self.sink.persist(&batch) {
            Ok(report) => report,
            Err(err) => {
                error!("[save] {count} samples dropped, table write failed: {err}");
                return Err(err);
            }
        };
        let outcome = match report.artifact {
            Artifact::Missing { .. } => FlushOutcome::Partial(report),
            _ => FlushOutcome::Saved(report),
        };
        match &outcome {
            FlushOutcome::Partial(_) => warn!("[save] {outcome}"),
            _ => info!("[save] {outcome}"),
        }
        Ok(outcome)
    }
    /// Schedules the timer trigger; `on_outcome` sees every tick's result.
    pub fn attach<F>(self: &Arc<Self>, ticker: &mut dyn Ticker, mut on_outcome: F)
    where
        F: FnMut(Result<TickOutcome, StreamError>) + Send + 'static,
    {
        let scheduler = Arc::clone(self);
        ticker.schedule(
            self.policy.save_every,
            Box::new(move || on_outcome(scheduler.on_tick())),
        );
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::sink::tests::{scratch_dir, stub_sink};
    use crate::stream::sink::ArtifactFormat;
    use crate::stream::{ManualTicker, Sample};
    use chrono::Local;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    /// Counts persist calls; fails them when `fail` is set.
    struct CountingSink {
        calls: AtomicUsize,
        fail: bool,
    }
    impl BatchSink for CountingSink {
        fn persist(&self, batch: &Batch) -> Result<SaveReport, StreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StreamError::TableWrite {
                    path: "/readonly/accel.csv".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok(SaveReport {
                samples: batch.len(),
                tabular_path: "accel_1.csv".into(),
                artifact: Artifact::Primary(crate::stream::ArtifactFile {
                    path: "accel_1.png".into(),
                    format: ArtifactFormat::Png,
                }),
            })
        }
    }
    fn counting(fail: bool) -> Arc<CountingSink> {
        Arc::new(CountingSink {
            calls: AtomicUsize::new(0),
            fail,
        })
    }
    fn fill(buffer: &AccumulationBuffer, n: usize) {
        for i in 0..n {
            buffer.append(Sample::new(Local::now(), vec![i as f64, 0.0, 0.0]));
        }
    }
    fn policy(min_points: usize) -> SavePolicy {
        SavePolicy {
            save_every: Duration::from_secs(5),
            min_points,
        }
    }
    #[test]
    fn tick_below_threshold_keeps_buffer() {
        let buffer = Arc::new(AccumulationBuffer::new());
        let sink = counting(false);
        let scheduler = AutosaveScheduler::new(Arc::clone(&buffer), sink.clone(), policy(10));
        fill(&buffer, 4);
        assert_eq!(scheduler.on_tick().unwrap(), TickOutcome::Skipped { pending: 4 });
        fill(&buffer, 4);
        assert_eq!(scheduler.on_tick().unwrap(), TickOutcome::Skipped { pending: 8 });
        fill(&buffer, 2);
        let outcome = scheduler.on_tick().unwrap();
        assert!(matches!(outcome, TickOutcome::Flushed(FlushOutcome::Saved(ref r)) if r.samples == 10));
        assert_eq!(buffer.len(), 0);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }
    #[test]
    fn force_flush_on_empty_buffer_skips_sink() {
        let buffer = Arc::new(AccumulationBuffer::new());
        let sink = counting(false);
        let scheduler = AutosaveScheduler::new(buffer, sink.clone(), policy(10));
        let result = scheduler.force_flush();
        assert_eq!(result.as_ref().unwrap(), &FlushOutcome::NothingToSave);
        assert_eq!(status_line(&result), "No data buffered yet");
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }
    #[test]
    fn force_flush_ignores_threshold() {
        let buffer = Arc::new(AccumulationBuffer::new());
        let scheduler = AutosaveScheduler::new(Arc::clone(&buffer), counting(false), policy(100));
        fill(&buffer, 3);
        let result = scheduler.force_flush();
        assert_eq!(status_line(&result), "Saved 3 samples: accel_1.csv + accel_1.png");
        assert!(buffer.is_empty());
    }
    #[test]
    fn table_failure_is_fatal_and_not_requeued() {
        let buffer = Arc::new(AccumulationBuffer::new());
        let scheduler = AutosaveScheduler::new(Arc::clone(&buffer), counting(true), policy(1));
        fill(&buffer, 5);
        let result = scheduler.force_flush();
        assert!(matches!(result, Err(StreamError::TableWrite { .. })));
        assert!(status_line(&result).starts_with("Save failed:"));
        assert_eq!(buffer.len(), 0);
    }
    #[test]
    fn fallback_and_partial_outcomes_are_distinct() {
        let dir = scratch_dir("autosave");
        let buffer = Arc::new(AccumulationBuffer::new());
        let fallback = AutosaveScheduler::new(
            Arc::clone(&buffer),
            Arc::new(stub_sink(&dir, false, true)),
            policy(1),
        );
        fill(&buffer, 2);
        let outcome = fallback.force_flush().unwrap();
        match &outcome {
            FlushOutcome::Saved(report) => assert!(report.artifact.is_fallback()),
            other => panic!("expected fallback save, got {other:?}"),
        }
        assert!(outcome.to_string().contains("(SVG fallback)"));
        let partial = AutosaveScheduler::new(
            Arc::clone(&buffer),
            Arc::new(stub_sink(&dir, false, false)),
            policy(1),
        );
        fill(&buffer, 2);
        let outcome = partial.force_flush().unwrap();
        assert!(matches!(outcome, FlushOutcome::Partial(_)));
        assert!(outcome.to_string().contains("chart failed"));
        std::fs::remove_dir_all(dir).ok();
    }
    #[test]
    fn attached_timer_flushes_on_schedule() {
        let buffer = Arc::new(AccumulationBuffer::new());
        let sink = counting(false);
        let scheduler = Arc::new(AutosaveScheduler::new(
            Arc::clone(&buffer),
            sink.clone(),
            policy(3),
        ));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut ticker = ManualTicker::new();
        let log = Arc::clone(&seen);
        scheduler.attach(&mut ticker, move |result| {
            log.lock().unwrap().push(result.unwrap());
        });
        fill(&buffer, 2);
        ticker.advance(Duration::from_secs(5));
        fill(&buffer, 2);
        ticker.advance(Duration::from_secs(4));
        assert_eq!(seen.lock().unwrap().len(), 1);
        ticker.advance(Duration::from_secs(1));
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], TickOutcome::Skipped { pending: 2 });
        assert!(matches!(&seen[1], TickOutcome::Flushed(o) if o.samples() == 4));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }
    #[test]
    fn shutdown_flushes_remaining_samples() {
        let buffer = Arc::new(AccumulationBuffer::new());
        let sink = counting(false);
        let scheduler = AutosaveScheduler::new(Arc::clone(&buffer), sink.clone(), policy(1000));
        fill(&buffer, 7);
        assert_eq!(scheduler.shutdown().unwrap().samples(), 7);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.buffer_status(), "Buffered: 0 samples");
    }
}
