// src/types.rs
use crate::stream::Frame;
// 控制端发给后台的命令
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Persist whatever is buffered right now, ignoring the minimum.
    ForceSave,
    /// Stop the timers, run the final flush and exit.
    Shutdown,
}
// 后台发给控制端的消息
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Log(String),
    /// New samples for the live display.
    Frame(Frame),
    /// Status line of a save attempt, successful or not.
    Saved(String),
    /// Samples waiting in the accumulation buffer.
    Buffered(usize),
    Stopped,
}
