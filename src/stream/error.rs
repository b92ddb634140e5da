use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("unknown channel `{0}`")]
    UnknownChannel(String),
    #[error("channel index {index} out of range for {count} channels")]
    ChannelOutOfRange { index: usize, count: usize },
    #[error("value for channel `{channel}` is not numeric: {raw:?}")]
    NonNumeric { channel: String, raw: String },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to write table {}: {source}", path.display())]
    TableWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("failed to load history {}: {reason}", path.display())]
    History { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
impl StreamError {
    /// Malformed input is rejected at the ingestion boundary and never fatal.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            StreamError::UnknownChannel(_)
                | StreamError::ChannelOutOfRange { .. }
                | StreamError::NonNumeric { .. }
        )
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for StreamError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        StreamError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for StreamError {
    fn from(value: image::ImageError) -> Self {
        StreamError::Plot(value.to_string())
    }
}
