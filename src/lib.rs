// Hatarake library
// Tracks time since the last pomodoro and nags over growl when it grows too long

pub mod app;
pub mod cli;
pub mod core;
pub mod feed;
pub mod notify;
pub mod tui;
pub mod utils;

// Re-export commonly used types
pub use app::App;
pub use crate::core::{Config, FeedKind, Session};
pub use feed::{FeedError, Fetcher};
pub use notify::{GntpTransport, Growler};

// Error handling
pub use anyhow::{Error, Result};
