//! Building blocks for a split-pane terminal console: a bounded, scrollable
//! log buffer fed by any number of producers, and an asynchronous Lua REPL
//! whose evaluations run on a dedicated execution context.
//!
//! The terminal UI itself lives in the `pw-console` binary; everything in
//! this crate is toolkit-agnostic and can be driven from tests.

use chrono::{DateTime, Local};
use tracing::Level;

pub mod commands;
pub mod config;
pub mod log_container;
pub mod log_layer;
pub mod redraw;
pub mod repl;
pub mod text;

pub use commands::{Command, CommandTable, Key, KeyBinding, Scope};
pub use config::ConsoleConfig;
pub use log_container::{LogContainer, LogHandler, LogLine, DEFAULT_HISTORY_SIZE};
pub use log_layer::LogPaneLayer;
pub use redraw::RedrawSignal;
pub use repl::{
    render_transcript, Evaluation, Evaluator, ExecutionState, Interrupt, LuaEvaluator, ReplPane,
    UserCodeExecution,
};
pub use text::format_bytes;

/// A single log event as produced by a logging facility.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub channel: String,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogRecord {
    /// Creates a record stamped with the current local time.
    pub fn new(level: Level, channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            channel: channel.into(),
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
