use std::collections::VecDeque;
use std::sync::Mutex;
use crate::stream::{lock, Sample};
/// Bounded, thread-safe window over the most recent samples.
pub struct RingWindow {
    samples: Mutex<VecDeque<Sample>>,
    capacity: usize,
}
impl RingWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn len(&self) -> usize {
        lock(&self.samples).len()
    }
    pub fn is_empty(&self) -> bool {
        lock(&self.samples).is_empty()
    }
    pub fn push(&self, sample: Sample) {
        if self.capacity == 0 {
            return;
        }
        let mut samples = lock(&self.samples);
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }
    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        lock(&self.samples).iter().cloned().collect()
    }
    pub fn latest(&self) -> Option<Sample> {
        lock(&self.samples).back().cloned()
    }
}
