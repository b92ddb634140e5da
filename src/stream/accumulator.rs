use std::sync::Mutex;
use crate::stream::{lock, Batch, Sample};
/// Unbounded sample log that persistence empties with `drain`.
#[derive(Default)]
pub struct AccumulationBuffer {
    samples: Mutex<Vec<Sample>>,
}
impl AccumulationBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn append(&self, sample: Sample) {
        lock(&self.samples).push(sample);
    }
    pub fn len(&self) -> usize {
        lock(&self.samples).len()
    }
    pub fn is_empty(&self) -> bool {
        lock(&self.samples).is_empty()
    }
    /// Takes everything appended so far and leaves the buffer empty.
    pub fn drain(&self) -> Batch {
        Batch::from(std::mem::take(&mut *lock(&self.samples)))
    }
    /// Drains only when at least `min` samples are buffered; otherwise returns the
    /// current count and leaves the buffer untouched. Check and drain share one lock.
    pub fn drain_at_least(&self, min: usize) -> Result<Batch, usize> {
        let mut samples = lock(&self.samples);
        if samples.len() < min {
            return Err(samples.len());
        }
        Ok(Batch::from(std::mem::take(&mut *samples)))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    fn sample(v: f64) -> Sample {
        Sample::new(Local::now(), vec![v])
    }
    #[test]
    fn drain_empties_and_preserves_order() {
        let buffer = AccumulationBuffer::new();
        for i in 0..5 {
            buffer.append(sample(i as f64));
        }
        let batch = buffer.drain();
        let values: Vec<f64> = batch.iter().map(|s| s.values()[0]).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }
    #[test]
    fn drain_at_least_respects_threshold() {
        let buffer = AccumulationBuffer::new();
        buffer.append(sample(1.0));
        buffer.append(sample(2.0));
        assert_eq!(buffer.drain_at_least(3), Err(2));
        assert_eq!(buffer.len(), 2);
        buffer.append(sample(3.0));
        assert_eq!(buffer.drain_at_least(3).unwrap().len(), 3);
        assert_eq!(buffer.len(), 0);
    }
    #[test]
    fn concurrent_append_and_drain_lose_nothing() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 2_000;
        let buffer = Arc::new(AccumulationBuffer::new());
        let done = Arc::new(AtomicBool::new(false));
        let drainer = {
            let buffer = Arc::clone(&buffer);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut drained = Vec::new();
                while !done.load(Ordering::Acquire) {
                    drained.extend(buffer.drain().into_samples());
                    thread::yield_now();
                }
                drained
            })
        };
        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        buffer.append(sample((w * PER_WRITER + i) as f64));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        let drained = drainer.join().unwrap();
        let remaining = buffer.drain().into_samples();
        assert_eq!(drained.len() + remaining.len(), WRITERS * PER_WRITER);
        let mut ids: Vec<u64> = drained
            .iter()
            .chain(remaining.iter())
            .map(|s| s.values()[0] as u64)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), WRITERS * PER_WRITER);
    }
}
