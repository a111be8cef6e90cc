use chrono::Duration;

use super::{Note, NoteType, Transport};
use crate::core::nag::{below_floor, format_elapsed, priority_for};

pub const NAG_TITLE: &str = "働け";
pub const NAG_IDENTIFIER: &str = "hatarake.nag";

/// Best-effort notifier: delivery failures are logged, never returned
pub struct Growler<T> {
    transport: T,
}

impl<T: Transport> Growler<T> {
    /// Register with the notification server; failure only logs
    pub async fn new(transport: T) -> Self {
        if let Err(e) = transport.register().await {
            tracing::error!("Error registering with growl server: {}", e);
        }
        Growler { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn deliver(&self, note: Note) {
        if let Err(e) = self.transport.notify(&note).await {
            tracing::error!("Error sending growl message: {}", e);
        }
    }

    pub async fn info(&self, title: &str, message: &str) {
        self.deliver(Note::info(title, message)).await;
    }

    pub async fn nag(&self, name: &str, elapsed: Duration) {
        if below_floor(elapsed) {
            return;
        }
        self.deliver(Note {
            note_type: NoteType::Nag,
            title: NAG_TITLE.to_string(),
            description: format!("[{}] was {} ago", name, format_elapsed(elapsed)),
            sticky: true,
            priority: priority_for(elapsed),
            identifier: Some(NAG_IDENTIFIER.to_string()),
        })
        .await;
    }
}
