use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Local};
use crate::stream::StreamError;
/// Fixed, ordered set of channel names. Index order is value order in every sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSet {
    names: Arc<[String]>,
}
impl ChannelSet {
    pub fn new<I, S>(names: I) -> Result<Self, StreamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(StreamError::InvalidConfig(
                "at least one channel is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(StreamError::InvalidConfig(format!(
                    "duplicate channel name `{name}`"
                )));
            }
        }
        Ok(Self {
            names: names.into(),
        })
    }
    /// The usual three spatial axes.
    pub fn xyz() -> Self {
        Self {
            names: vec!["x".to_owned(), "y".to_owned(), "z".to_owned()].into(),
        }
    }
    pub fn len(&self) -> usize {
        self.names.len()
    }
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
    pub fn names(&self) -> &[String] {
        &self.names
    }
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
    pub fn resolve(&self, key: &ChannelKey) -> Result<usize, StreamError> {
        match key {
            ChannelKey::Index(index) if *index < self.names.len() => Ok(*index),
            ChannelKey::Index(index) => Err(StreamError::ChannelOutOfRange {
                index: *index,
                count: self.names.len(),
            }),
            ChannelKey::Name(name) => self
                .names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| StreamError::UnknownChannel(name.clone())),
        }
    }
}
/// How a producer addresses a channel: by position or by configured name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Index(usize),
    Name(String),
}
impl From<usize> for ChannelKey {
    fn from(value: usize) -> Self {
        ChannelKey::Index(value)
    }
}
impl From<&str> for ChannelKey {
    fn from(value: &str) -> Self {
        ChannelKey::Name(value.to_owned())
    }
}
impl From<String> for ChannelKey {
    fn from(value: String) -> Self {
        ChannelKey::Name(value)
    }
}
impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKey::Index(index) => write!(f, "#{index}"),
            ChannelKey::Name(name) => f.write_str(name),
        }
    }
}
/// Unvalidated report as delivered by a transport: key plus the value as text.
#[derive(Clone, Debug)]
pub struct RawReport {
    pub key: ChannelKey,
    pub raw: String,
    pub received_at: DateTime<Local>,
}
impl RawReport {
    pub fn new(key: impl Into<ChannelKey>, raw: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            raw: raw.into(),
            received_at: Local::now(),
        }
    }
}
/// One validated channel reading waiting to be assembled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisValue {
    pub channel: usize,
    pub value: f64,
    pub received_at: DateTime<Local>,
}
/// Immutable multi-channel record. Clones share the value storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    timestamp: DateTime<Local>,
    values: Arc<[f64]>,
}
impl Sample {
    pub fn new(timestamp: DateTime<Local>, values: Vec<f64>) -> Self {
        Self {
            timestamp,
            values: values.into(),
        }
    }
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
    pub fn values(&self) -> &[f64] {
        &self.values
    }
    pub fn value(&self, channel: usize) -> Option<f64> {
        self.values.get(channel).copied()
    }
    pub fn channel_count(&self) -> usize {
        self.values.len()
    }
}
/// Samples accumulated since the previous flush, in emission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    samples: Vec<Sample>,
}
impl Batch {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}
impl From<Vec<Sample>> for Batch {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}
