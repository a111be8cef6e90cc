use std::io;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARN" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "TRACE" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Captures formatted tracing output and forwards it to the status panel
#[derive(Clone)]
pub struct TuiWriter {
    sender: mpsc::UnboundedSender<LogEntry>,
}

impl TuiWriter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogEntry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (TuiWriter { sender }, receiver)
    }
}

impl io::Write for TuiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines() {
            if let Some(entry) = parse_tracing_line(line) {
                // receiver gone means the panel has shut down
                let _ = self.sender.send(entry);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TuiWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Parse `<timestamp> <LEVEL> <target>: <message>`; the level column is padded
fn parse_tracing_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fallback = || LogEntry {
        level: LogLevel::Info,
        message: line.to_string(),
        timestamp: chrono::Utc::now(),
    };

    let Some((timestamp, rest)) = line.split_once(char::is_whitespace) else {
        return Some(fallback());
    };
    let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(timestamp) else {
        return Some(fallback());
    };

    let rest = rest.trim_start();
    let (level, rest) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let Some(level) = LogLevel::parse(level) else {
        return Some(fallback());
    };

    let rest = rest.trim_start();
    let message = match rest.split_once(": ") {
        Some((target, message)) if !target.contains(' ') => message,
        _ => rest,
    };

    Some(LogEntry {
        level,
        message: message.to_string(),
        timestamp: timestamp.with_timezone(&chrono::Utc),
    })
}
