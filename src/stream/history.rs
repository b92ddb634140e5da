use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use chrono::{Local, NaiveDateTime, TimeZone};
use log::{info, warn};
use crate::stream::pager::{Direction, WindowCursor};
use crate::stream::stats::{summarize, ChannelSummary};
use crate::stream::{ChannelSet, Sample, StreamError};
const TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
/// A saved table loaded back into memory.
#[derive(Clone, Debug)]
pub struct History {
    pub source: PathBuf,
    pub channels: ChannelSet,
    pub samples: Vec<Sample>,
    /// Rows dropped because of a wrong field count or unparsable fields.
    pub skipped_rows: usize,
}
impl History {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
fn parse_timestamp(field: &str) -> Option<chrono::DateTime<Local>> {
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(field, layout).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}
fn parse_row(line: &str, channel_count: usize) -> Option<Sample> {
    let mut fields = line.split(',').map(str::trim);
    let timestamp = parse_timestamp(fields.next()?)?;
    let values: Vec<f64> = fields
        .map(|f| f.parse::<f64>().ok())
        .collect::<Option<_>>()?;
    (values.len() == channel_count).then(|| Sample::new(timestamp, values))
}
/// Reads a `timestamp,<channels...>` table written by the file sink.
pub fn load_history(path: &Path) -> Result<History, StreamError> {
    let history_err = |reason: String| StreamError::History {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| history_err(e.to_string()))?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| history_err("file is empty".into()))?;
    let mut columns = header.split(',').map(str::trim);
    if columns.next() != Some("timestamp") {
        return Err(history_err("first column must be `timestamp`".into()));
    }
    let channels = ChannelSet::new(columns).map_err(|e| history_err(e.to_string()))?;
    let mut samples = Vec::new();
    let mut skipped_rows = 0;
    for line in lines {
        match parse_row(line, channels.len()) {
            Some(sample) => samples.push(sample),
            None => skipped_rows += 1,
        }
    }
    if skipped_rows > 0 {
        warn!("{}: skipped {skipped_rows} malformed rows", path.display());
    }
    Ok(History {
        source: path.to_path_buf(),
        channels,
        samples,
        skipped_rows,
    })
}
fn csv_entries(dir: &Path) -> Result<Vec<(PathBuf, SystemTime)>, StreamError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "csv") {
            let modified = fs::metadata(&path)?.modified()?;
            entries.push((path, modified));
        }
    }
    Ok(entries)
}
/// Most recently modified `.csv` in `dir`; ties go to the later file name.
pub fn newest_csv(dir: &Path) -> Result<Option<PathBuf>, StreamError> {
    Ok(csv_entries(dir)?
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(path, _)| path))
}
/// Reloads when a newer table shows up in a watched folder.
pub struct HistoryWatcher {
    dir: PathBuf,
    last: Option<(PathBuf, SystemTime)>,
}
impl HistoryWatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last: None,
        }
    }
    /// Returns the newest table when it differs from the last one loaded.
    /// Empty tables are ignored and retried on the next poll.
    pub fn poll(&mut self) -> Result<Option<History>, StreamError> {
        let Some(path) = newest_csv(&self.dir)? else {
            return Ok(None);
        };
        let modified = fs::metadata(&path)?.modified()?;
        let changed = match &self.last {
            Some((last_path, last_modified)) => *last_path != path || modified > *last_modified,
            None => true,
        };
        if !changed {
            return Ok(None);
        }
        let history = load_history(&path)?;
        if history.is_empty() {
            return Ok(None);
        }
        info!("loaded {} ({} rows)", path.display(), history.len());
        self.last = Some((path, modified));
        Ok(Some(history))
    }
}
/// A loaded history plus the viewer's page cursor.
pub struct HistoryView {
    history: History,
    cursor: WindowCursor,
}
impl HistoryView {
    pub fn new(history: History, page_size: usize) -> Self {
        Self {
            history,
            cursor: WindowCursor::new(page_size),
        }
    }
    pub fn history(&self) -> &History {
        &self.history
    }
    pub fn cursor(&self) -> WindowCursor {
        self.cursor
    }
    pub fn current(&self) -> &[Sample] {
        self.cursor.view(&self.history.samples)
    }
    pub fn step(&mut self, direction: Direction) -> &[Sample] {
        self.cursor = self.cursor.step(self.history.len(), direction);
        self.current()
    }
    pub fn set_page_size(&mut self, page_size: usize) {
        self.cursor = self.cursor.with_page_size(page_size, self.history.len());
    }
    /// Swaps in a new sequence and resets the cursor to the first page.
    pub fn replace(&mut self, history: History) {
        self.history = history;
        self.cursor = self.cursor.reset();
    }
    pub fn summary(&self) -> Vec<ChannelSummary> {
        summarize(&self.history.channels, self.current())
    }
}
