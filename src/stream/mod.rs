// src/stream/mod.rs
pub mod accumulator;
pub mod assembler;
pub mod autosave;
pub mod error;
pub mod history;
pub mod pager;
pub mod pipeline;
pub mod plot;
pub mod poller;
pub mod sample;
pub mod sink;
pub mod source;
pub mod stats;
pub mod ticker;
pub mod window;
pub use accumulator::AccumulationBuffer;
pub use assembler::SampleAssembler;
pub use autosave::{status_line, AutosaveScheduler, FlushOutcome, SavePolicy, TickOutcome};
pub use error::StreamError;
pub use history::{load_history, newest_csv, History, HistoryView, HistoryWatcher};
pub use pager::{page, Direction, WindowCursor};
pub use pipeline::SamplePipeline;
pub use plot::{render_batch_png, render_batch_svg, PlotStyle, PngRenderer, SvgRenderer};
pub use poller::{Columns, Frame, PollFeed, PollOutcome, WindowPoller};
pub use sample::{AxisValue, Batch, ChannelKey, ChannelSet, RawReport, Sample};
pub use sink::{
    Artifact, ArtifactFile, ArtifactFormat, BatchSink, ChartRenderer, FileSink, SaveReport,
    TableWriter,
};
pub use source::{AxisSource, ManualSource, SimulatedSource};
pub use stats::{summarize, ChannelSummary};
pub use ticker::{ManualTicker, Task, ThreadTicker, Ticker};
pub use window::RingWindow;
use std::sync::{Mutex, MutexGuard, PoisonError};
/// Locks, ignoring poisoning. Guarded state is never left mid-update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
