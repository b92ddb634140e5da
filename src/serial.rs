use std::io::{BufRead, BufReader, ErrorKind};
use std::mem;
use std::time::Duration;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{info, warn};
use serialport::SerialPort;
use crate::stream::{AxisSource, ChannelKey, RawReport, StreamError};
const READ_TIMEOUT: Duration = Duration::from_millis(200);
/// Splits one `v0,v1,...` line into per-channel raw reports sharing `at`.
/// Returns `None` for blank lines and lines with the wrong field count.
pub fn split_line(line: &str, channel_count: usize, at: DateTime<Local>) -> Option<Vec<RawReport>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != channel_count {
        return None;
    }
    Some(
        fields
            .into_iter()
            .enumerate()
            .map(|(i, raw)| RawReport {
                key: ChannelKey::Index(i),
                raw: raw.to_owned(),
                received_at: at,
            })
            .collect(),
    )
}
/// Line-oriented source: every complete line carries one value per channel.
pub struct LineSource<R> {
    reader: R,
    partial: Vec<u8>,
    channel_count: usize,
    skipped: u64,
}
pub type SerialSource = LineSource<BufReader<Box<dyn SerialPort>>>;
impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, channel_count: usize) -> Self {
        Self {
            reader,
            partial: Vec::new(),
            channel_count,
            skipped: 0,
        }
    }
    /// Lines dropped because they were not UTF-8 or did not split into
    /// `channel_count` fields.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }
}
impl SerialSource {
    pub fn open(port: &str, baud_rate: u32, channel_count: usize) -> Result<Self> {
        let handle = serialport::new(port, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port {port} at {baud_rate} baud"))?;
        info!("reading {channel_count} channels from {port} @ {baud_rate}");
        Ok(Self::new(BufReader::new(handle), channel_count))
    }
}
impl<R: BufRead> AxisSource for LineSource<R> {
    fn next_reports(&mut self) -> Result<Option<Vec<RawReport>>, StreamError> {
        match self.reader.read_until(b'\n', &mut self.partial) {
            Ok(0) if self.partial.is_empty() => return Ok(None),
            // a line or the unterminated tail before EOF
            Ok(_) => {}
            // the bytes read so far stay in `partial` for the next call
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Ok(Some(Vec::new()))
            }
            Err(e) => return Err(e.into()),
        }
        let bytes = mem::take(&mut self.partial);
        let Ok(line) = String::from_utf8(bytes) else {
            self.skipped += 1;
            warn!("skipped line with invalid UTF-8 ({} skipped so far)", self.skipped);
            return Ok(Some(Vec::new()));
        };
        match split_line(&line, self.channel_count, Local::now()) {
            Some(reports) => Ok(Some(reports)),
            None => {
                if !line.trim().is_empty() {
                    self.skipped += 1;
                    warn!("skipped line {:?}: expected {} fields", line.trim(), self.channel_count);
                }
                Ok(Some(Vec::new()))
            }
        }
    }
}
