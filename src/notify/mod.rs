//! Desktop notifications over the Growl notification transport protocol.

pub mod gntp;
pub mod growler;

use async_trait::async_trait;

use crate::core::Priority;

pub use gntp::{GntpTransport, OriginInfo};
pub use growler::Growler;

pub const APPLICATION_NAME: &str = "Hatarake";

/// Registered notification types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteType {
    Nag,
    Info,
}

impl NoteType {
    pub const ALL: [NoteType; 2] = [NoteType::Nag, NoteType::Info];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::Nag => "Nag",
            NoteType::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub note_type: NoteType,
    pub title: String,
    pub description: String,
    pub sticky: bool,
    pub priority: Priority,
    pub identifier: Option<String>,
}

impl Note {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Note {
            note_type: NoteType::Info,
            title: title.into(),
            description: description.into(),
            sticky: false,
            priority: Priority::Normal,
            identifier: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("could not reach notification server at {addr}: {source}")]
    Connect { addr: String, source: std::io::Error },
    #[error("notification server i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("notification server timed out")]
    Timeout,
    #[error("notification server rejected request ({code}): {description}")]
    Rejected { code: String, description: String },
    #[error("unexpected response from notification server: {0}")]
    Protocol(String),
}

/// Wire-level delivery of notes
#[async_trait]
pub trait Transport: Send + Sync {
    async fn register(&self) -> Result<(), NotifyError>;
    async fn notify(&self, note: &Note) -> Result<(), NotifyError>;
}
