use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The two timed mutes offered in the Pause menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauseKind {
    FifteenMinutes,
    OneHour,
}

impl PauseKind {
    pub fn duration(self) -> Duration {
        match self {
            PauseKind::FifteenMinutes => Duration::minutes(15),
            PauseKind::OneHour => Duration::hours(1),
        }
    }

    pub fn other(self) -> PauseKind {
        match self {
            PauseKind::FifteenMinutes => PauseKind::OneHour,
            PauseKind::OneHour => PauseKind::FifteenMinutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseChange {
    Paused { until: DateTime<Utc> },
    Resumed,
}

/// Tracks which mute is switched on and until when nags stay quiet
#[derive(Debug, Clone)]
pub struct PauseControl {
    disabled_until: DateTime<Utc>,
    active: Option<PauseKind>,
}

impl PauseControl {
    pub fn new(now: DateTime<Utc>) -> Self {
        PauseControl {
            disabled_until: now,
            active: None,
        }
    }

    pub fn disabled_until(&self) -> DateTime<Utc> {
        self.disabled_until
    }

    pub fn is_checked(&self, kind: PauseKind) -> bool {
        self.active == Some(kind)
    }

    /// Flip one mute. Turning one on unchecks the other.
    pub fn toggle(&mut self, kind: PauseKind, now: DateTime<Utc>) -> PauseChange {
        if self.is_checked(kind) {
            self.active = None;
            self.disabled_until = now;
            tracing::info!("Pause {:?} switched off", kind);
            PauseChange::Resumed
        } else {
            self.active = Some(kind);
            self.disabled_until = now + kind.duration();
            tracing::info!("Pausing alerts until {}", self.disabled_until);
            PauseChange::Paused {
                until: self.disabled_until,
            }
        }
    }

    /// Nags are skipped up to and including the deadline
    pub fn is_paused(&self, now: DateTime<Utc>) -> bool {
        now <= self.disabled_until
    }
}
