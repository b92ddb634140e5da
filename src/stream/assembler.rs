use crate::stream::{AxisValue, Sample, StreamError};
/// Collects one value per channel and emits a sample once every channel has reported.
///
/// Not synchronised on its own: `SamplePipeline` keeps it behind a single mutex so
/// the reported flags and the pending values always change together.
#[derive(Debug)]
pub struct SampleAssembler {
    pending: Vec<Option<f64>>, // channel -> latest value in the current cycle
    reported: usize,
}
impl SampleAssembler {
    pub fn new(channel_count: usize) -> Self {
        Self {
            pending: vec![None; channel_count],
            reported: 0,
        }
    }
    pub fn channel_count(&self) -> usize {
        self.pending.len()
    }
    /// Number of channels that have reported in the current cycle.
    pub fn reported_channels(&self) -> usize {
        self.reported
    }
    /// Records a reading. A repeated report for the same channel overwrites the
    /// pending value. Returns the sample when this report completes the cycle.
    pub fn report(&mut self, value: AxisValue) -> Result<Option<Sample>, StreamError> {
        let count = self.pending.len();
        let slot = self
            .pending
            .get_mut(value.channel)
            .ok_or(StreamError::ChannelOutOfRange {
                index: value.channel,
                count,
            })?;
        if slot.is_none() {
            self.reported += 1;
        }
        *slot = Some(value.value);
        if self.reported < count {
            return Ok(None);
        }
        let values: Vec<f64> = self.pending.iter_mut().filter_map(Option::take).collect();
        self.reported = 0;
        Ok(Some(Sample::new(value.received_at, values)))
    }
    /// Drops a half-finished cycle.
    pub fn reset(&mut self) {
        self.pending.iter_mut().for_each(|slot| *slot = None);
        self.reported = 0;
    }
}
