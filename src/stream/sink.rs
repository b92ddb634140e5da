use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use chrono::Local;
use log::{error, warn};
use crate::stream::{Batch, StreamError};
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactFormat {
    Png,
    Svg,
}
impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Png => "png",
            ArtifactFormat::Svg => "svg",
        }
    }
}
impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactFormat::Png => "PNG",
            ArtifactFormat::Svg => "SVG",
        })
    }
}
/// Writes the tabular record of a batch. Failures are fatal for the flush.
pub trait TableWriter: Send + Sync {
    fn extension(&self) -> &'static str {
        "csv"
    }
    fn write_table(&self, path: &Path, batch: &Batch) -> Result<(), StreamError>;
}
/// Renders a chart of a batch to `path` in its own format.
pub trait ChartRenderer: Send + Sync {
    fn format(&self) -> ArtifactFormat;
    fn render(&self, batch: &Batch, path: &Path) -> Result<(), StreamError>;
}
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub format: ArtifactFormat,
}
/// Which renderer produced the chart, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    Primary(ArtifactFile),
    Fallback {
        file: ArtifactFile,
        primary_error: String,
    },
    Missing {
        primary_error: String,
        fallback_error: String,
    },
}
impl Artifact {
    pub fn file(&self) -> Option<&ArtifactFile> {
        match self {
            Artifact::Primary(file) | Artifact::Fallback { file, .. } => Some(file),
            Artifact::Missing { .. } => None,
        }
    }
    pub fn is_fallback(&self) -> bool {
        matches!(self, Artifact::Fallback { .. })
    }
}
/// What one successful tabular write produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub samples: usize,
    pub tabular_path: PathBuf,
    pub artifact: Artifact,
}
/// Destination for drained batches.
pub trait BatchSink: Send + Sync {
    fn persist(&self, batch: &Batch) -> Result<SaveReport, StreamError>;
}
/// Writes `{prefix}_{timestamp}.csv` plus a chart next to it in `dir`.
pub struct FileSink {
    dir: PathBuf,
    prefix: String,
    table: Box<dyn TableWriter>,
    primary: Box<dyn ChartRenderer>,
    fallback: Box<dyn ChartRenderer>,
}
impl FileSink {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        table: Box<dyn TableWriter>,
        primary: Box<dyn ChartRenderer>,
        fallback: Box<dyn ChartRenderer>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            table,
            primary,
            fallback,
        }
    }
    pub fn dir(&self) -> &Path {
        &self.dir
    }
    /// Claims an unused base name by creating its table file with
    /// `create_new`, so concurrent flushes never share a name.
    fn reserve_base(&self) -> Result<PathBuf, StreamError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let mut base = self.dir.join(format!("{}_{stamp}", self.prefix));
        let mut suffix = 0u32;
        loop {
            let table_path = with_extension(&base, self.table.extension());
            match OpenOptions::new().write(true).create_new(true).open(&table_path) {
                Ok(_) => return Ok(base),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    suffix += 1;
                    base = self.dir.join(format!("{}_{stamp}_{suffix}", self.prefix));
                }
                Err(source) => {
                    return Err(StreamError::TableWrite {
                        path: table_path,
                        source,
                    })
                }
            }
        }
    }
    fn render_artifact(&self, base: &Path, batch: &Batch) -> Artifact {
        let primary_path = with_extension(base, self.primary.format().extension());
        let primary_error = match self.primary.render(batch, &primary_path) {
            Ok(()) => {
                return Artifact::Primary(ArtifactFile {
                    path: primary_path,
                    format: self.primary.format(),
                })
            }
            Err(err) => err.to_string(),
        };
        warn!(
            "{} renderer unavailable ({primary_error}); falling back to {}",
            self.primary.format(),
            self.fallback.format()
        );
        let fallback_path = with_extension(base, self.fallback.format().extension());
        match self.fallback.render(batch, &fallback_path) {
            Ok(()) => Artifact::Fallback {
                file: ArtifactFile {
                    path: fallback_path,
                    format: self.fallback.format(),
                },
                primary_error,
            },
            Err(err) => {
                error!("chart not written: {err}");
                Artifact::Missing {
                    primary_error,
                    fallback_error: err.to_string(),
                }
            }
        }
    }
}
impl BatchSink for FileSink {
    fn persist(&self, batch: &Batch) -> Result<SaveReport, StreamError> {
        fs::create_dir_all(&self.dir).map_err(|source| StreamError::TableWrite {
            path: self.dir.clone(),
            source,
        })?;
        let base = self.reserve_base()?;
        let tabular_path = with_extension(&base, self.table.extension());
        if let Err(err) = self.table.write_table(&tabular_path, batch) {
            // drop the reserved placeholder
            fs::remove_file(&tabular_path).ok();
            return Err(err);
        }
        let artifact = self.render_artifact(&base, batch);
        Ok(SaveReport {
            samples: batch.len(),
            tabular_path,
            artifact,
        })
    }
}
/// Appends `.ext` without touching dots already in the file name.
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
