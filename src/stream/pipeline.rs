use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use chrono::{DateTime, Local};
use log::{debug, warn};
use crate::stream::{
    lock, AccumulationBuffer, AxisSource, AxisValue, ChannelKey, ChannelSet, PollFeed,
    RawReport, RingWindow, Sample, SampleAssembler, StreamError, WindowPoller,
};
/// Ingestion hub: validates reports, assembles samples and fans every emitted
/// sample out to the live window, the poller feed and the accumulation buffer.
pub struct SamplePipeline {
    channels: ChannelSet,
    assembler: Mutex<SampleAssembler>,
    window: Arc<RingWindow>,
    feed: Arc<PollFeed>,
    accumulator: Arc<AccumulationBuffer>,
    emitted: AtomicU64,
    rejected: AtomicU64,
}
impl SamplePipeline {
    pub fn new(channels: ChannelSet, window_points: usize) -> Self {
        Self {
            assembler: Mutex::new(SampleAssembler::new(channels.len())),
            channels,
            window: Arc::new(RingWindow::with_capacity(window_points)),
            feed: Arc::new(PollFeed::new()),
            accumulator: Arc::new(AccumulationBuffer::new()),
            emitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }
    pub fn window(&self) -> Arc<RingWindow> {
        Arc::clone(&self.window)
    }
    pub fn accumulator(&self) -> Arc<AccumulationBuffer> {
        Arc::clone(&self.accumulator)
    }
    pub fn feed(&self) -> Arc<PollFeed> {
        Arc::clone(&self.feed)
    }
    pub fn poller(&self, max_append: usize) -> WindowPoller {
        WindowPoller::new(self.feed(), max_append)
    }
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
    /// Typed ingestion. Returns the sample if this report completed a cycle.
    pub fn report(
        &self,
        key: impl Into<ChannelKey>,
        value: f64,
        at: DateTime<Local>,
    ) -> Result<Option<Sample>, StreamError> {
        let key = key.into();
        let channel = self.validate(&key, || {
            (!value.is_finite()).then(|| value.to_string())
        })?;
        self.accept(AxisValue {
            channel,
            value,
            received_at: at,
        })
    }
    /// Text ingestion as delivered by a transport; the value must parse as a
    /// finite number.
    pub fn ingest(&self, report: RawReport) -> Result<Option<Sample>, StreamError> {
        let parsed = report.raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let channel = self.validate(&report.key, || {
            parsed.is_none().then(|| report.raw.clone())
        })?;
        let value = parsed.ok_or_else(|| StreamError::NonNumeric {
            channel: report.key.to_string(),
            raw: report.raw.clone(),
        })?;
        self.accept(AxisValue {
            channel,
            value,
            received_at: report.received_at,
        })
    }
    /// Feeds one chunk from `source`. Malformed reports are counted and skipped.
    /// Returns `None` once the source is exhausted, otherwise the samples emitted.
    pub fn pump<S: AxisSource + ?Sized>(&self, source: &mut S) -> Result<Option<usize>, StreamError> {
        let Some(reports) = source.next_reports()? else {
            return Ok(None);
        };
        let mut emitted = 0;
        for report in reports {
            match self.ingest(report) {
                Ok(Some(_)) => emitted += 1,
                Ok(None) => {}
                Err(err) if err.is_malformed_input() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(Some(emitted))
    }
    fn validate(
        &self,
        key: &ChannelKey,
        bad_value: impl FnOnce() -> Option<String>,
    ) -> Result<usize, StreamError> {
        let checked = self.channels.resolve(key).and_then(|channel| match bad_value() {
            Some(raw) => Err(StreamError::NonNumeric {
                channel: key.to_string(),
                raw,
            }),
            None => Ok(channel),
        });
        if let Err(err) = &checked {
            let total = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("rejected report ({total} so far): {err}");
        }
        checked
    }
    fn accept(&self, value: AxisValue) -> Result<Option<Sample>, StreamError> {
        // Fan-out happens under the assembler lock so every container sees
        // samples in emission order.
        let mut assembler = lock(&self.assembler);
        let Some(sample) = assembler.report(value)? else {
            return Ok(None);
        };
        self.window.push(sample.clone());
        self.feed.offer(sample.clone());
        self.accumulator.append(sample.clone());
        let n = self.emitted.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("sample #{n} assembled: {:?}", sample.values());
        Ok(Some(sample))
    }
}
