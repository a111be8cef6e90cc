use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use super::pause::PauseControl;

/// A completed pomodoro. Only the most recent one is ever kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub end: DateTime<Utc>,
}

impl Session {
    pub fn new(name: impl Into<String>, end: DateTime<Utc>) -> Self {
        Session {
            name: name.into(),
            end,
        }
    }

    /// Time between the end of this session and `now`
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        truncate_to_second(now) - self.end
    }
}

/// Everything the clock tick needs to decide whether to nag
#[derive(Debug, Clone)]
pub struct NagState {
    pub last_session: Option<Session>,
    pub pause: PauseControl,
    pub delay: std::time::Duration,
}

impl NagState {
    pub fn new(delay: std::time::Duration, now: DateTime<Utc>) -> Self {
        NagState {
            last_session: None,
            pause: PauseControl::new(now),
            delay,
        }
    }

    /// Replace the current session wholesale
    pub fn replace_session(&mut self, session: Session) -> Option<Session> {
        self.last_session.replace(session)
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_session.as_ref().map(|s| s.elapsed(now))
    }
}

pub fn truncate_to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::seconds(1)).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_elapsed_ignores_subsecond_now() {
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let session = Session::new("Write report", end);
        let now = end + Duration::minutes(16) + Duration::milliseconds(750);

        assert_eq!(session.elapsed(now), Duration::minutes(16));
    }

    #[test]
    fn test_replace_session_returns_previous() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut state = NagState::new(std::time::Duration::from_secs(60), t0);
        assert!(state.elapsed(t0).is_none());

        assert!(state.replace_session(Session::new("A", t0)).is_none());
        let previous = state.replace_session(Session::new("B", t0 + Duration::hours(1)));

        assert_eq!(previous.map(|s| s.name), Some("A".to_string()));
        assert_eq!(state.last_session.as_ref().unwrap().name, "B");
    }
}
