//! Minimal iCalendar (RFC 5545) reader.
//!
//! Only what the session picker needs: line unfolding, content line parsing,
//! the direct children of `VCALENDAR`, and DTEND/SUMMARY values.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::FeedError;
use crate::core::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl Property {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A direct child of VCALENDAR (VEVENT, VTODO, VTIMEZONE, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: String,
    pub properties: Vec<Property>,
}

impl Component {
    fn new(kind: &str) -> Self {
        Component {
            kind: kind.to_ascii_uppercase(),
            properties: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn summary(&self) -> Option<String> {
        self.get("SUMMARY").map(|p| unescape_text(&p.value))
    }

    pub fn dtend(&self) -> Result<Option<DateTime<Utc>>, FeedError> {
        self.get("DTEND").map(parse_date_time).transpose()
    }
}

/// Join folded lines back together
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

fn parse_content_line(line: &str) -> Result<Property, FeedError> {
    let mut in_quotes = false;
    let mut split_at = None;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                split_at = Some(idx);
                break;
            }
            _ => {}
        }
    }
    let split_at =
        split_at.ok_or_else(|| FeedError::Parse(format!("content line without value: {}", line)))?;
    let (head, value) = (&line[..split_at], &line[split_at + 1..]);

    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next().unwrap_or_default().trim().to_ascii_uppercase();
    if name.is_empty() {
        return Err(FeedError::Parse(format!("content line without name: {}", line)));
    }

    let mut params = Vec::new();
    for param in parts {
        let (key, val) = param
            .split_once('=')
            .ok_or_else(|| FeedError::Parse(format!("malformed parameter: {}", param)))?;
        params.push((
            key.trim().to_ascii_uppercase(),
            val.trim().trim_matches('"').to_string(),
        ));
    }

    Ok(Property {
        name,
        params,
        value: value.to_string(),
    })
}

fn split_unquoted(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in s.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        if ch == sep && !in_quotes {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    out.push(current);
    out
}

/// Parse a calendar document into the components directly under VCALENDAR
pub fn parse_calendar(text: &str) -> Result<Vec<Component>, FeedError> {
    let mut components = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<Component> = None;
    let mut seen_calendar = false;

    for line in unfold(text) {
        if line.trim().is_empty() {
            continue;
        }
        let prop = parse_content_line(&line)?;
        match prop.name.as_str() {
            "BEGIN" => {
                let kind = prop.value.trim().to_ascii_uppercase();
                match stack.len() {
                    0 if kind == "VCALENDAR" => seen_calendar = true,
                    0 => {
                        return Err(FeedError::Parse(format!(
                            "expected VCALENDAR, found {}",
                            kind
                        )))
                    }
                    1 => current = Some(Component::new(&kind)),
                    _ => {}
                }
                stack.push(kind);
            }
            "END" => {
                let kind = prop.value.trim().to_ascii_uppercase();
                match stack.pop() {
                    Some(open) if open == kind => {}
                    Some(open) => {
                        return Err(FeedError::Parse(format!(
                            "END:{} does not close BEGIN:{}",
                            kind, open
                        )))
                    }
                    None => return Err(FeedError::Parse(format!("unexpected END:{}", kind))),
                }
                if stack.len() == 1 {
                    if let Some(component) = current.take() {
                        components.push(component);
                    }
                }
            }
            _ => match stack.len() {
                0 => {
                    return Err(FeedError::Parse(format!(
                        "property {} outside VCALENDAR",
                        prop.name
                    )))
                }
                2 => {
                    if let Some(component) = current.as_mut() {
                        component.properties.push(prop);
                    }
                }
                // calendar-level properties and nested components (VALARM)
                _ => {}
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Parse(format!("unterminated BEGIN:{}", open)));
    }
    if !seen_calendar {
        return Err(FeedError::Parse("no VCALENDAR found".to_string()));
    }
    Ok(components)
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn in_zone(naive: NaiveDateTime, tzid: Option<&str>) -> Result<DateTime<Utc>, FeedError> {
    let resolved = match tzid.map(|id| id.trim_start_matches('/').parse::<chrono_tz::Tz>()) {
        Some(Ok(tz)) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Err(_)) => {
            tracing::warn!("Unknown TZID {:?}, using local time", tzid);
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }
        None => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    };
    resolved.ok_or_else(|| FeedError::Parse(format!("{} does not exist in its timezone", naive)))
}

/// DATE-TIME in UTC, with TZID, floating (local), or a bare DATE
pub fn parse_date_time(prop: &Property) -> Result<DateTime<Utc>, FeedError> {
    let value = prop.value.trim();
    let tzid = prop.param("TZID");
    let is_date = prop
        .param("VALUE")
        .map(|v| v.eq_ignore_ascii_case("DATE"))
        .unwrap_or(value.len() == 8);

    if is_date {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d")
            .map_err(|e| FeedError::Parse(format!("bad {} date {:?}: {}", prop.name, value, e)))?;
        return in_zone(date.and_time(chrono::NaiveTime::MIN), tzid);
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").map_err(|e| {
            FeedError::Parse(format!("bad {} value {:?}: {}", prop.name, value, e))
        })?;
        return Ok(naive.and_utc());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .map_err(|e| FeedError::Parse(format!("bad {} value {:?}: {}", prop.name, value, e)))?;
    in_zone(naive, tzid)
}

/// Pick the entry that anchors the elapsed-time display.
///
/// The first component seeds the candidate whether or not it has a DTEND.
/// After that, entries without DTEND are skipped, and an entry replaces the
/// candidate when the candidate has no DTEND or ends strictly earlier.
pub fn select_most_recent(components: &[Component]) -> Result<Session, FeedError> {
    let mut recent: Option<(&Component, Option<DateTime<Utc>>)> = None;

    for entry in components {
        let end = entry.dtend()?;
        let Some((_, recent_end)) = recent else {
            recent = Some((entry, end));
            continue;
        };
        let Some(end) = end else {
            continue;
        };
        match recent_end {
            Some(current) if end <= current => {}
            _ => recent = Some((entry, Some(end))),
        }
    }

    match recent {
        None => Err(FeedError::Empty),
        Some((entry, Some(end))) => Ok(Session::new(entry.summary().unwrap_or_default(), end)),
        Some((entry, None)) => Err(FeedError::Parse(format!(
            "most recent {} has no DTEND",
            entry.kind
        ))),
    }
}
