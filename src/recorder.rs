use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::stream::{Batch, ChannelSet, StreamError, TableWriter};
/// Timestamp layout used in every saved table, e.g. `2025-08-12T15:31:17.042`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
/// CSV table: `timestamp,<channel names...>`, one row per sample.
pub struct CsvTable {
    channels: ChannelSet,
}
impl CsvTable {
    pub fn new(channels: ChannelSet) -> Self {
        Self { channels }
    }
    fn write_rows(&self, path: &Path, batch: &Batch) -> std::io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        write!(w, "timestamp")?;
        for name in self.channels.names() {
            write!(w, ",{name}")?;
        }
        writeln!(w)?;
        for sample in batch.iter() {
            write!(w, "{}", sample.timestamp().format(TIMESTAMP_FORMAT))?;
            for value in sample.values() {
                write!(w, ",{value}")?;
            }
            writeln!(w)?;
        }
        w.flush()
    }
}
impl TableWriter for CsvTable {
    fn write_table(&self, path: &Path, batch: &Batch) -> Result<(), StreamError> {
        if let Some(sample) = batch.iter().find(|s| s.channel_count() != self.channels.len()) {
            return Err(StreamError::ChannelMismatch {
                expected: self.channels.len(),
                actual: sample.channel_count(),
            });
        }
        self.write_rows(path, batch)
            .map_err(|source| StreamError::TableWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}
