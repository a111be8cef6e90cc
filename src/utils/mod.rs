pub mod logging;
pub mod tui_writer;

pub use logging::LogControl;
pub use tui_writer::{LogEntry, LogLevel, TuiWriter};
