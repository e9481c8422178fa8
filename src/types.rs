// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

use jiff::Timestamp;
use url::Url;

/// Location of a resource as exchanged in `href` elements: a server path or
/// an absolute URL, kept exactly as received or built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Wraps an href value.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    /// The href as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque resource version identifier, sent back to the server in
/// `If-Match` / `If-None-Match` preconditions.
///
/// The value is kept verbatim, surrounding quotes included; servers compare
/// it byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETag(String);

impl ETag {
    /// Wraps an entity tag as received from the server.
    #[must_use]
    pub fn new(etag: impl Into<String>) -> Self {
        Self(etag.into())
    }

    /// The tag as a string slice, suitable for a precondition header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A calendar collection on a `CalDAV` server.
///
/// Values are immutable snapshots; mutation goes through
/// [`crate::CalDavClient::update_calendar`] which returns a fresh value.
#[derive(Debug, Clone)]
pub struct Calendar {
    /// Stable identifier. Servers rarely publish one, in which case the
    /// collection's path serves as the identifier.
    pub uid: String,
    /// Absolute URL of the collection, always with a trailing slash.
    pub href: Href,
    /// Display name, "Untitled" when the server omits it.
    pub display_name: String,
    /// Calendar description.
    pub description: Option<String>,
    /// Calendar color, `#RRGGBB` or `#RRGGBBAA`.
    pub color: Option<String>,
    /// Calendar timezone, stored as the server returned it.
    pub timezone: Option<String>,
    /// Collection tag, changes when any child resource changes.
    pub ctag: Option<String>,
    /// Supported component types. Never empty; defaults to `VEVENT`.
    pub supported_components: Vec<String>,
    /// Whether the current user lacks write privileges on this collection.
    pub is_read_only: bool,
}

impl Calendar {
    /// Creates a calendar with defaults for everything but the href.
    ///
    /// The href is also the initial uid; parsing fills in server-assigned
    /// fields afterwards.
    #[must_use]
    pub fn new(href: Href) -> Self {
        Self {
            uid: href.as_str().to_string(),
            href,
            display_name: "Untitled".to_string(),
            description: None,
            color: None,
            timezone: None,
            ctag: None,
            supported_components: vec!["VEVENT".to_string()],
            is_read_only: false,
        }
    }
}

/// Fields for calendar creation and update.
///
/// Only the supplied fields are sent; `None` leaves the server value alone.
#[derive(Debug, Clone, Default)]
pub struct CalendarPatch {
    /// Display name.
    pub display_name: Option<String>,
    /// Calendar description.
    pub description: Option<String>,
    /// Calendar color, `#RRGGBB` or `#RRGGBBAA`.
    pub color: Option<String>,
    /// Calendar timezone.
    pub timezone: Option<String>,
    /// Supported component types.
    pub supported_components: Option<Vec<String>>,
}

/// A VEVENT resource.
///
/// Events compare equal by [`uid`](Self::uid) alone.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    /// The iCalendar UID; also the basis of the resource path `<uid>.ics`.
    pub uid: String,
    /// Identifier of the parent [`Calendar`].
    pub calendar_id: String,
    /// URL of the `.ics` resource; absent before creation.
    pub href: Option<Href>,
    /// Entity tag; absent until returned by the server.
    pub etag: Option<ETag>,
    /// Start instant (UTC).
    pub start: Timestamp,
    /// End instant (UTC); `>= start` when set.
    pub end: Option<Timestamp>,
    /// Summary, "Untitled" when the payload omits it.
    pub summary: String,
    /// Description text.
    pub description: Option<String>,
    /// Location text.
    pub location: Option<String>,
    /// Whether DTSTART carried `VALUE=DATE` or an 8-char date-only value.
    /// All-day events have both instants at midnight UTC.
    pub is_all_day: bool,
    /// Original server payload, preserved verbatim for round-trip fidelity.
    pub raw_icalendar: Option<String>,
    /// Inherited from the parent calendar at parse time.
    pub is_read_only: bool,
    /// RRULE value, passed through opaquely.
    pub rrule: Option<String>,
    /// RECURRENCE-ID value, passed through opaquely.
    pub recurrence_id: Option<String>,
    /// EXDATE values in document order, passed through opaquely.
    pub exdate: Vec<String>,
}

impl CalendarEvent {
    /// Creates an event with the required fields; everything else defaults.
    #[must_use]
    pub fn new(uid: String, calendar_id: String, start: Timestamp, summary: String) -> Self {
        Self {
            uid,
            calendar_id,
            href: None,
            etag: None,
            start,
            end: None,
            summary,
            description: None,
            location: None,
            is_all_day: false,
            raw_icalendar: None,
            is_read_only: false,
            rrule: None,
            recurrence_id: None,
            exdate: Vec::new(),
        }
    }
}

impl PartialEq for CalendarEvent {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for CalendarEvent {}

/// Resolved `CalDAV` endpoints for one server/account.
///
/// All three URLs are absolute. Cached by the client for its lifetime unless
/// explicitly cleared.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    /// Endpoint selected by the well-known stage.
    pub caldav_endpoint: Url,
    /// The authenticated user's principal URL.
    pub principal_url: Url,
    /// The user's calendar home collection.
    pub calendar_home_set: Url,
    /// Principal display name, when the server volunteered one.
    pub display_name: Option<String>,
}

/// Compliance tokens advertised in a server's `DAV` response header.
///
/// An OPTIONS response carries a comma-separated compliance list such as
/// `1, 2, access-control, calendar-access`. The probe keeps the tokens and
/// answers capability questions from them.
#[derive(Debug, Clone, Default)]
pub struct ServerCapabilities {
    tokens: Vec<String>,
}

impl ServerCapabilities {
    /// Splits the comma-separated compliance list of a `DAV` header.
    #[must_use]
    pub fn from_dav_header(header: &str) -> Self {
        let tokens = header
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    /// Whether the header advertised the given compliance token
    /// (case-insensitive).
    #[must_use]
    pub fn advertises(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(token))
    }

    /// Whether the server is a `CalDAV` server.
    ///
    /// RFC 4791 §5.1 requires the `calendar-access` token; the
    /// calendar-query and calendar-multiget REPORTs come with it.
    #[must_use]
    pub fn supports_calendars(&self) -> bool {
        self.advertises("calendar-access")
    }

    /// Whether MKCALENDAR can be expected to work.
    ///
    /// `calendar-access` carries MKCALENDAR; `extended-mkcol` (RFC 5689)
    /// covers servers that only create collections through extended MKCOL.
    #[must_use]
    pub fn supports_mkcalendar(&self) -> bool {
        self.advertises("calendar-access") || self.advertises("extended-mkcol")
    }
}
