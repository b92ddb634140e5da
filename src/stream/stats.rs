use crate::stream::{ChannelSet, Sample};
/// Summary of one channel over a page of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSummary {
    pub channel: String,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two samples.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}
/// Per-channel mean / std / min / max, in channel order. Empty input yields no rows.
pub fn summarize(channels: &ChannelSet, samples: &[Sample]) -> Vec<ChannelSummary> {
    if samples.is_empty() {
        return Vec::new();
    }
    channels
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<f64> = samples.iter().filter_map(|s| s.value(idx)).collect();
            summarize_values(name, &values)
        })
        .collect()
}
fn summarize_values(name: &str, values: &[f64]) -> ChannelSummary {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.len() > 1).then(|| {
        let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (sum_sq / (n - 1.0)).sqrt()
    });
    ChannelSummary {
        channel: name.to_owned(),
        mean,
        std,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    #[test]
    fn summarizes_each_channel() {
        let channels = ChannelSet::new(["a", "b"]).unwrap();
        let samples: Vec<Sample> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|v| Sample::new(Local::now(), vec![*v, 10.0]))
            .collect();
        let rows = summarize(&channels, &samples);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].channel, "a");
        assert_eq!(rows[0].mean, 2.5);
        assert!((rows[0].std.unwrap() - 1.290_994).abs() < 1e-6);
        assert_eq!((rows[0].min, rows[0].max), (1.0, 4.0));
        assert_eq!(rows[1].std, Some(0.0));
    }
    #[test]
    fn single_sample_has_no_std() {
        let channels = ChannelSet::new(["a"]).unwrap();
        let rows = summarize(&channels, &[Sample::new(Local::now(), vec![5.0])]);
        assert_eq!(rows[0].std, None);
        assert!(summarize(&channels, &[]).is_empty());
    }
}
