use std::collections::VecDeque;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use crate::stream::{RawReport, StreamError};
/// Something that yields per-channel reports on demand.
///
/// `Ok(None)` means the source is exhausted; `Ok(Some(vec![]))` means nothing
/// arrived this time but more may follow.
pub trait AxisSource {
    fn next_reports(&mut self) -> Result<Option<Vec<RawReport>>, StreamError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Vec<RawReport>>,
}
impl ManualSource {
    pub fn new(chunks: impl IntoIterator<Item = Vec<RawReport>>) -> Self {
        Self {
            queue: chunks.into_iter().collect(),
        }
    }
}
impl AxisSource for ManualSource {
    fn next_reports(&mut self) -> Result<Option<Vec<RawReport>>, StreamError> {
        Ok(self.queue.pop_front())
    }
}
/// Endless sine-wave generator. Each call reports every channel once, in a
/// shuffled order, the way independent cloud callbacks arrive.
pub struct SimulatedSource {
    channel_count: usize,
    phase: f64,
    step: f64,
    noise: f64,
    rng: StdRng,
}
impl SimulatedSource {
    pub fn new(channel_count: usize) -> Self {
        Self::with_rng(channel_count, StdRng::from_entropy())
    }
    pub fn seeded(channel_count: usize, seed: u64) -> Self {
        Self::with_rng(channel_count, StdRng::seed_from_u64(seed))
    }
    fn with_rng(channel_count: usize, rng: StdRng) -> Self {
        Self {
            channel_count,
            phase: 0.0,
            step: 0.1,
            noise: 0.05,
            rng,
        }
    }
}
impl AxisSource for SimulatedSource {
    fn next_reports(&mut self) -> Result<Option<Vec<RawReport>>, StreamError> {
        self.phase += self.step;
        let mut order: Vec<usize> = (0..self.channel_count).collect();
        order.shuffle(&mut self.rng);
        let reports = order
            .into_iter()
            .map(|channel| {
                let base = (self.phase * (channel as f64 * 0.3 + 1.0)).sin();
                let value = base + self.rng.gen_range(-self.noise..=self.noise);
                RawReport::new(channel, format!("{value:.5}"))
            })
            .collect();
        Ok(Some(reports))
    }
}
