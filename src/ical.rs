// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! iCalendar codec (RFC 5545): unfolding, property tokenization, date-time
//! handling, TEXT escaping, and VEVENT (de)serialization.
//!
//! The codec collapses TZID-qualified local times into UTC without applying
//! DST rules; the original payload is preserved on the parsed event so
//! callers can apply a richer timezone library when they need one.

use jiff::Timestamp;
use jiff::civil::{Date, Time};
use jiff::tz::TimeZone;

use crate::error::CalDavError;
use crate::types::CalendarEvent;

/// PRODID emitted on serialized payloads.
pub const PRODID: &str = "-//caldav-client//NONSGML caldav-client//EN";

/// Removes RFC 5545 §3.1 line folding.
///
/// A continuation is `CRLF` or `LF` followed by a single SPACE or HTAB.
#[must_use]
pub fn unfold(input: &str) -> String {
    input
        .replace("\r\n ", "")
        .replace("\r\n\t", "")
        .replace("\n ", "")
        .replace("\n\t", "")
}

/// A tokenized content line: `NAME[;PARAM=VALUE...]:value`.
#[derive(Debug, Clone)]
pub struct ContentLine {
    /// Property name, uppercased.
    pub name: String,
    /// Parameters as (uppercased key, value) pairs. A parameter written
    /// without `=` (e.g. a positional `DATE`) is stored under `VALUE`.
    pub params: Vec<(String, String)>,
    /// Raw property value, unmodified.
    pub value: String,
}

impl ContentLine {
    /// Tokenizes one unfolded line. Lines without a `:` yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let (left, value) = line.split_once(':')?;
        let mut segments = left.split(';');
        let name = segments.next()?.trim().to_uppercase();
        if name.is_empty() {
            return None;
        }

        let params = segments
            .filter(|s| !s.is_empty())
            .map(|s| match s.split_once('=') {
                Some((k, v)) => (k.trim().to_uppercase(), v.to_string()),
                None => ("VALUE".to_string(), s.to_string()),
            })
            .collect();

        Some(Self {
            name,
            params,
            value: value.to_string(),
        })
    }

    /// Value of the parameter with the given (uppercase) key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Escapes TEXT property values for emission.
///
/// Backslash first, so that decoding restores the original.
#[must_use]
pub fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// Unescapes TEXT property values from the wire.
#[must_use]
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                // Unknown escape, keep it verbatim.
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// A decoded date or date-time value.
#[derive(Debug, Clone, Copy)]
pub struct DecodedDateTime {
    /// The instant, coerced to UTC.
    pub timestamp: Timestamp,
    /// Whether the value was date-only.
    pub date_only: bool,
}

/// Decodes an iCalendar DATE or DATE-TIME value.
///
/// Accepted forms: `YYYYMMDDTHHMMSSZ` (UTC), `YYYYMMDD` (midnight UTC,
/// date-only), and `YYYYMMDDTHHMMSS` (civil time reinterpreted as UTC; DST
/// rules are out of scope).
///
/// # Errors
///
/// Returns [`CalDavError::Parse`] for any other shape.
pub fn decode_datetime(value: &str) -> Result<DecodedDateTime, CalDavError> {
    let value = value.trim();

    if value.len() == 8 {
        return Ok(DecodedDateTime {
            timestamp: midnight_utc(parse_basic_date(value)?)?,
            date_only: true,
        });
    }

    // YYYYMMDDTHHMMSS, optionally with a trailing Z. A TZID-qualified local
    // time lands here too and is reinterpreted as UTC.
    let (date_part, time_part) = value
        .split_once('T')
        .ok_or_else(|| CalDavError::Parse(format!("invalid DATE-TIME '{value}'")))?;
    let time_part = time_part.strip_suffix('Z').unwrap_or(time_part);

    let date = parse_basic_date(date_part)?;
    let time = parse_basic_time(time_part)?;
    let timestamp = date
        .to_datetime(time)
        .to_zoned(TimeZone::UTC)
        .map_err(|e| CalDavError::Parse(format!("invalid DATE-TIME '{value}': {e}")))?
        .timestamp();

    Ok(DecodedDateTime {
        timestamp,
        date_only: false,
    })
}

/// Parses the 8-digit basic-format date `YYYYMMDD`.
fn parse_basic_date(s: &str) -> Result<Date, CalDavError> {
    let err = || CalDavError::Parse(format!("invalid DATE '{s}'"));
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let year: i16 = s.get(0..4).ok_or_else(err)?.parse().map_err(|_| err())?;
    let month: i8 = s.get(4..6).ok_or_else(err)?.parse().map_err(|_| err())?;
    let day: i8 = s.get(6..8).ok_or_else(err)?.parse().map_err(|_| err())?;
    Date::new(year, month, day).map_err(|e| CalDavError::Parse(format!("invalid DATE '{s}': {e}")))
}

/// Parses the 6-digit basic-format time `HHMMSS`.
fn parse_basic_time(s: &str) -> Result<Time, CalDavError> {
    let err = || CalDavError::Parse(format!("invalid TIME '{s}'"));
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let hour: i8 = s.get(0..2).ok_or_else(err)?.parse().map_err(|_| err())?;
    let minute: i8 = s.get(2..4).ok_or_else(err)?.parse().map_err(|_| err())?;
    let second: i8 = s.get(4..6).ok_or_else(err)?.parse().map_err(|_| err())?;
    Time::new(hour, minute, second, 0)
        .map_err(|e| CalDavError::Parse(format!("invalid TIME '{s}': {e}")))
}

/// Formats an instant as a UTC basic-format date-time, `YYYYMMDDTHHMMSSZ`.
#[must_use]
pub fn format_utc(timestamp: Timestamp) -> String {
    timestamp
        .to_zoned(TimeZone::UTC)
        .strftime("%Y%m%dT%H%M%SZ")
        .to_string()
}

/// Formats an instant as a UTC basic-format date, `YYYYMMDD`.
#[must_use]
pub fn format_utc_date(timestamp: Timestamp) -> String {
    timestamp
        .to_zoned(TimeZone::UTC)
        .strftime("%Y%m%d")
        .to_string()
}

fn midnight_utc(date: Date) -> Result<Timestamp, CalDavError> {
    date.to_datetime(Time::midnight())
        .to_zoned(TimeZone::UTC)
        .map(|z| z.timestamp())
        .map_err(|e| CalDavError::Parse(format!("invalid date: {e}")))
}

/// Truncates an instant to the midnight UTC of its date.
fn truncate_to_midnight(timestamp: Timestamp) -> Result<Timestamp, CalDavError> {
    midnight_utc(timestamp.to_zoned(TimeZone::UTC).date())
}

/// Parses the first VEVENT of an iCalendar payload into a typed event.
///
/// Junk tolerance follows the required-field policy: a VEVENT missing `UID`
/// or `DTSTART` (or carrying an undecodable one) yields `None`, so a batch
/// with some junk still yields the good events. `SUMMARY` defaults to
/// "Untitled".
#[must_use]
pub fn parse_event(calendar_id: &str, ics: &str, read_only: bool) -> Option<CalendarEvent> {
    let unfolded = unfold(ics);

    let mut uid = None;
    let mut start: Option<DecodedDateTime> = None;
    let mut end: Option<DecodedDateTime> = None;
    let mut start_is_date_param = false;
    let mut summary = None;
    let mut description = None;
    let mut location = None;
    let mut rrule = None;
    let mut recurrence_id = None;
    let mut exdate = Vec::new();

    let mut in_event = false;
    let mut nested = 0u32;
    for raw in unfolded.lines() {
        let raw = raw.trim_end_matches('\r');
        if raw.is_empty() {
            continue;
        }
        let Some(line) = ContentLine::parse(raw) else {
            continue;
        };

        if !in_event {
            in_event = line.name == "BEGIN" && line.value.eq_ignore_ascii_case("VEVENT");
            continue;
        }
        // Properties of nested components (VALARM) are not the event's.
        if line.name == "BEGIN" {
            nested += 1;
            continue;
        }
        if line.name == "END" {
            if nested == 0 && line.value.eq_ignore_ascii_case("VEVENT") {
                break;
            }
            nested = nested.saturating_sub(1);
            continue;
        }
        if nested > 0 {
            continue;
        }

        // Last occurrence wins for single-value properties; EXDATE collects.
        match line.name.as_str() {
            "UID" => uid = Some(line.value.trim().to_string()),
            "DTSTART" => {
                start = decode_datetime(&line.value).ok();
                start_is_date_param = line.param("VALUE").is_some_and(|v| v == "DATE");
            }
            "DTEND" => end = decode_datetime(&line.value).ok(),
            "SUMMARY" => summary = Some(unescape_text(&line.value)),
            "DESCRIPTION" => description = Some(unescape_text(&line.value)),
            "LOCATION" => location = Some(unescape_text(&line.value)),
            "RRULE" => rrule = Some(line.value.clone()),
            "RECURRENCE-ID" => recurrence_id = Some(line.value.clone()),
            "EXDATE" => {
                exdate.extend(
                    line.value
                        .split(',')
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                );
            }
            _ => {}
        }
    }

    let uid = uid.filter(|u| !u.is_empty())?;
    let start = start?;

    let is_all_day = start.date_only || start_is_date_param;
    let mut start_ts = start.timestamp;
    let mut end_ts = end.map(|e| e.timestamp);
    if is_all_day {
        start_ts = truncate_to_midnight(start_ts).ok()?;
        end_ts = end_ts.and_then(|ts| truncate_to_midnight(ts).ok());
    }
    // DTEND before DTSTART is junk; drop the end rather than the event.
    if end_ts.is_some_and(|e| e < start_ts) {
        end_ts = None;
    }

    let mut event = CalendarEvent::new(
        uid,
        calendar_id.to_string(),
        start_ts,
        summary.filter(|s| !s.is_empty()).unwrap_or_else(|| "Untitled".to_string()),
    );
    event.end = end_ts;
    event.description = description;
    event.location = location;
    event.is_all_day = is_all_day;
    event.raw_icalendar = Some(ics.to_string());
    event.is_read_only = read_only;
    event.rrule = rrule;
    event.recurrence_id = recurrence_id;
    event.exdate = exdate;
    Some(event)
}

/// Serializes an event as a complete VCALENDAR envelope with one VEVENT.
///
/// Date-times are emitted in UTC `...Z` form; all-day events emit
/// `;VALUE=DATE` with 8-digit values. No output folding is performed
/// (servers universally accept long lines).
#[must_use]
pub fn serialize_event(event: &CalendarEvent) -> String {
    let mut out = String::new();
    let mut push = |line: &str| {
        out.push_str(line);
        out.push_str("\r\n");
    };

    push("BEGIN:VCALENDAR");
    push("VERSION:2.0");
    push(&format!("PRODID:{PRODID}"));
    push("BEGIN:VEVENT");
    push(&format!("UID:{}", event.uid));
    push(&format!("DTSTAMP:{}", format_utc(Timestamp::now())));

    if event.is_all_day {
        push(&format!("DTSTART;VALUE=DATE:{}", format_utc_date(event.start)));
        if let Some(end) = event.end {
            push(&format!("DTEND;VALUE=DATE:{}", format_utc_date(end)));
        }
    } else {
        push(&format!("DTSTART:{}", format_utc(event.start)));
        if let Some(end) = event.end {
            push(&format!("DTEND:{}", format_utc(end)));
        }
    }

    push(&format!("SUMMARY:{}", escape_text(&event.summary)));
    if let Some(description) = &event.description {
        push(&format!("DESCRIPTION:{}", escape_text(description)));
    }
    if let Some(location) = &event.location {
        push(&format!("LOCATION:{}", escape_text(location)));
    }
    if let Some(rrule) = &event.rrule {
        push(&format!("RRULE:{rrule}"));
    }
    if let Some(recurrence_id) = &event.recurrence_id {
        push(&format!("RECURRENCE-ID:{recurrence_id}"));
    }
    if !event.exdate.is_empty() {
        push(&format!("EXDATE:{}", event.exdate.join(",")));
    }

    push("END:VEVENT");
    push("END:VCALENDAR");
    out
}
