use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;

use super::FeedError;
use crate::core::session::{truncate_to_second, Session};

/// Query asking the server for the newest record only
pub const LATEST_QUERY: [(&str, &str); 2] = [("orderby", "created"), ("limit", "1")];

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub results: Vec<ApiRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRecord {
    pub title: String,
    pub created: String,
    /// Length of the pomodoro in minutes
    pub duration: f64,
}

impl ApiRecord {
    pub fn created_at(&self) -> Result<DateTime<Utc>, FeedError> {
        parse_created(&self.created)
            .ok_or_else(|| FeedError::Parse(format!("bad created timestamp {:?}", self.created)))
    }

    pub fn into_session(self) -> Result<Session, FeedError> {
        let created = truncate_to_second(self.created_at()?);
        let end = self
            .length()
            .and_then(|length| created.checked_add_signed(length))
            .ok_or_else(|| FeedError::Parse(format!("bad duration {}", self.duration)))?;
        Ok(Session::new(self.title, end))
    }

    fn length(&self) -> Option<Duration> {
        let millis = (self.duration * 60_000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        Duration::try_milliseconds(millis as i64)
    }
}

/// RFC 3339, falling back to a naive timestamp read as UTC
fn parse_created(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

/// The server orders and limits; the last record left is the newest
pub fn session_from_body(body: &str) -> Result<Session, FeedError> {
    let mut response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| FeedError::Parse(format!("bad api response: {}", e)))?;
    response.results.pop().ok_or(FeedError::Empty)?.into_session()
}
