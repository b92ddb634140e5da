use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::recorder::CsvTable;
use crate::stream::{ChannelSet, FileSink, PlotStyle, PngRenderer, SavePolicy, StreamError, SvgRenderer};
/// Upper bound for `artifact_width` and `artifact_height`.
pub const MAX_ARTIFACT_SIDE: u32 = 8192;
/// Runtime settings, read from a JSON file. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub channels: Vec<String>,
    /// Live window capacity in samples.
    pub window_points: usize,
    /// Upper bound on samples handed to the display per poll.
    pub max_append: usize,
    pub poll_interval_ms: u64,
    pub save_every_sec: u64,
    pub min_points_to_save: usize,
    pub page_size: usize,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    /// Streams `x,y,z` lines from this port instead of the simulator.
    pub serial_port: Option<String>,
    pub baud_rate: u32,
    pub artifact_width: u32,
    pub artifact_height: u32,
}
impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channels: vec!["x".into(), "y".into(), "z".into()],
            window_points: 600,
            max_append: 15,
            poll_interval_ms: 150,
            save_every_sec: 5,
            min_points_to_save: 30,
            page_size: 200,
            output_dir: PathBuf::from("data"),
            output_prefix: "accel".into(),
            serial_port: None,
            baud_rate: 9600,
            artifact_width: 1200,
            artifact_height: 500,
        }
    }
}
impl StreamConfig {
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
    pub fn from_json(text: &str) -> Result<Self, StreamError> {
        serde_json::from_str(text).map_err(|e| StreamError::InvalidConfig(e.to_string()))
    }
    /// Checks every numeric knob and returns the channel set.
    pub fn validate(&self) -> Result<ChannelSet, StreamError> {
        let zero = [
            ("window_points", self.window_points as u64),
            ("max_append", self.max_append as u64),
            ("poll_interval_ms", self.poll_interval_ms),
            ("save_every_sec", self.save_every_sec),
            ("page_size", self.page_size as u64),
            ("artifact_width", self.artifact_width as u64),
            ("artifact_height", self.artifact_height as u64),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0);
        if let Some((field, _)) = zero {
            return Err(StreamError::InvalidConfig(format!("`{field}` must be at least 1")));
        }
        if self.artifact_width > MAX_ARTIFACT_SIDE || self.artifact_height > MAX_ARTIFACT_SIDE {
            return Err(StreamError::InvalidConfig(format!(
                "artifact size {}x{} exceeds {MAX_ARTIFACT_SIDE}x{MAX_ARTIFACT_SIDE}",
                self.artifact_width, self.artifact_height
            )));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(StreamError::InvalidConfig("`output_prefix` is empty".into()));
        }
        ChannelSet::new(self.channels.iter().cloned())
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
    pub fn save_every(&self) -> Duration {
        Duration::from_secs(self.save_every_sec)
    }
    pub fn save_policy(&self) -> SavePolicy {
        SavePolicy {
            save_every: self.save_every(),
            min_points: self.min_points_to_save,
        }
    }
    pub fn plot_style(&self) -> PlotStyle {
        PlotStyle {
            width: self.artifact_width,
            height: self.artifact_height,
            ..PlotStyle::default()
        }
    }
    /// CSV table, PNG chart with SVG fallback, all under `output_dir`.
    pub fn file_sink(&self, channels: ChannelSet) -> FileSink {
        let style = self.plot_style();
        FileSink::new(
            &self.output_dir,
            &self.output_prefix,
            Box::new(CsvTable::new(channels)),
            Box::new(PngRenderer { style: style.clone() }),
            Box::new(SvgRenderer { style }),
        )
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn missing_fields_take_defaults() {
        let cfg = StreamConfig::from_json(r#"{ "channels": ["ax", "ay"], "save_every_sec": 2 }"#).unwrap();
        assert_eq!(cfg.channels, vec!["ax", "ay"]);
        assert_eq!(cfg.save_every(), Duration::from_secs(2));
        assert_eq!(cfg.window_points, 600);
        assert_eq!(cfg.output_prefix, "accel");
        assert_eq!(cfg.validate().unwrap().len(), 2);
        assert_eq!(StreamConfig::from_json("{}").unwrap(), StreamConfig::default());
    }
    #[test]
    fn rejects_zero_knobs_and_bad_channels() {
        let zero_window = StreamConfig {
            window_points: 0,
            ..StreamConfig::default()
        };
        assert!(matches!(zero_window.validate(), Err(StreamError::InvalidConfig(_))));
        let duplicate = StreamConfig {
            channels: vec!["x".into(), "x".into()],
            ..StreamConfig::default()
        };
        assert!(duplicate.validate().is_err());
        let empty = StreamConfig {
            channels: Vec::new(),
            ..StreamConfig::default()
        };
        assert!(empty.validate().is_err());
        let huge = StreamConfig {
            artifact_width: 40_000,
            ..StreamConfig::default()
        };
        assert!(matches!(huge.validate(), Err(StreamError::InvalidConfig(_))));
        let largest = StreamConfig {
            artifact_width: MAX_ARTIFACT_SIDE,
            artifact_height: MAX_ARTIFACT_SIDE,
            ..StreamConfig::default()
        };
        assert!(largest.validate().is_ok());
        assert!(StreamConfig::from_json("{ not json").is_err());
        assert!(StreamConfig::from_json(r#"{ "max_append": -1 }"#).is_err());
    }
    #[test]
    fn derived_settings_follow_fields() {
        let cfg = StreamConfig {
            min_points_to_save: 7,
            artifact_width: 300,
            ..StreamConfig::default()
        };
        assert_eq!(cfg.save_policy().min_points, 7);
        assert_eq!(cfg.save_policy().save_every, Duration::from_secs(5));
        assert_eq!(cfg.plot_style().width, 300);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(150));
        let sink = cfg.file_sink(ChannelSet::xyz());
        assert_eq!(sink.dir(), Path::new("data"));
    }
}
