use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use chrono::{DateTime, Local};
use crate::stream::{lock, Sample};
/// Samples emitted since the poller last drained them, oldest first.
#[derive(Default)]
pub struct PollFeed {
    inbox: Mutex<VecDeque<Sample>>,
}
impl PollFeed {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn offer(&self, sample: Sample) {
        lock(&self.inbox).push_back(sample);
    }
    pub fn pending(&self) -> usize {
        lock(&self.inbox).len()
    }
    fn take_up_to(&self, max: usize) -> (Vec<Sample>, usize) {
        let mut inbox = lock(&self.inbox);
        let take = inbox.len().min(max);
        let samples: Vec<Sample> = inbox.drain(..take).collect();
        (samples, inbox.len())
    }
}
/// Incremental samples handed to a renderer on one poll.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub samples: Vec<Sample>,
    /// Samples still waiting in the feed after this poll.
    pub pending: usize,
}
/// Per-channel columns for renderers that extend one trace per channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Columns {
    pub timestamps: Vec<DateTime<Local>>,
    pub values: Vec<Vec<f64>>, // channel -> values
}
impl Frame {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn columns(&self, channel_count: usize) -> Columns {
        let mut values = vec![Vec::with_capacity(self.samples.len()); channel_count];
        let mut timestamps = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            timestamps.push(sample.timestamp());
            for (column, value) in values.iter_mut().zip(sample.values()) {
                column.push(*value);
            }
        }
        Columns { timestamps, values }
    }
}
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// Nothing arrived since the previous poll; the renderer can skip redrawing.
    NoUpdate,
    Update(Frame),
}
impl PollOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, PollOutcome::Update(_))
    }
    pub fn samples(&self) -> &[Sample] {
        match self {
            PollOutcome::NoUpdate => &[],
            PollOutcome::Update(frame) => &frame.samples,
        }
    }
    pub fn pending(&self) -> usize {
        match self {
            PollOutcome::NoUpdate => 0,
            PollOutcome::Update(frame) => frame.pending,
        }
    }
}
impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::NoUpdate => write!(f, "Waiting... inbox=0"),
            PollOutcome::Update(frame) => {
                write!(f, "Appended {} | inbox={}", frame.len(), frame.pending)
            }
        }
    }
}
/// Drains at most `max_append` new samples per call from a `PollFeed`.
pub struct WindowPoller {
    feed: Arc<PollFeed>,
    max_append: usize,
    delivered: u64,
}
impl WindowPoller {
    pub fn new(feed: Arc<PollFeed>, max_append: usize) -> Self {
        Self {
            feed,
            max_append: max_append.max(1),
            delivered: 0,
        }
    }
    pub fn max_append(&self) -> usize {
        self.max_append
    }
    /// Total samples handed out so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
    pub fn poll(&mut self) -> PollOutcome {
        let (samples, pending) = self.feed.take_up_to(self.max_append);
        if samples.is_empty() {
            return PollOutcome::NoUpdate;
        }
        self.delivered += samples.len() as u64;
        PollOutcome::Update(Frame { samples, pending })
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sample(v: f64) -> Sample {
        Sample::new(Local::now(), vec![v, -v])
    }
    fn firsts(outcome: &PollOutcome) -> Vec<f64> {
        outcome.samples().iter().map(|s| s.values()[0]).collect()
    }
    #[test]
    fn empty_feed_reports_no_update() {
        let mut poller = WindowPoller::new(Arc::new(PollFeed::new()), 5);
        let outcome = poller.poll();
        assert_eq!(outcome, PollOutcome::NoUpdate);
        assert!(!outcome.is_updated());
        assert_eq!(outcome.to_string(), "Waiting... inbox=0");
    }
    #[test]
    fn bursts_are_split_oldest_first() {
        let feed = Arc::new(PollFeed::new());
        let mut poller = WindowPoller::new(Arc::clone(&feed), 4);
        for i in 0..10 {
            feed.offer(sample(i as f64));
        }
        let first = poller.poll();
        assert_eq!(firsts(&first), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(first.pending(), 6);
        assert_eq!(first.to_string(), "Appended 4 | inbox=6");
        assert_eq!(firsts(&poller.poll()), vec![4.0, 5.0, 6.0, 7.0]);
        feed.offer(sample(10.0));
        let third = poller.poll();
        assert_eq!(firsts(&third), vec![8.0, 9.0, 10.0]);
        assert_eq!(third.pending(), 0);
        assert!(!poller.poll().is_updated());
        assert_eq!(poller.delivered(), 11);
    }
    #[test]
    fn interleaved_arrivals_are_delivered_exactly_once() {
        let feed = Arc::new(PollFeed::new());
        let mut poller = WindowPoller::new(Arc::clone(&feed), 3);
        let mut seen = Vec::new();
        let mut next = 0;
        // arrival cadence varies between 0 and 6 samples per poll
        for round in 0..40 {
            for _ in 0..((round * 5 + 3) % 7) {
                feed.offer(sample(next as f64));
                next += 1;
            }
            seen.extend(firsts(&poller.poll()));
        }
        loop {
            let outcome = poller.poll();
            if !outcome.is_updated() {
                break;
            }
            assert!(outcome.samples().len() <= 3);
            seen.extend(firsts(&outcome));
        }
        let expected: Vec<f64> = (0..next).map(|i| i as f64).collect();
        assert_eq!(seen, expected);
    }
    #[test]
    fn frame_splits_into_channel_columns() {
        let frame = Frame {
            samples: vec![sample(1.0), sample(2.0)],
            pending: 0,
        };
        let columns = frame.columns(2);
        assert_eq!(columns.timestamps.len(), 2);
        assert_eq!(columns.values, vec![vec![1.0, 2.0], vec![-1.0, -2.0]]);
    }
}
