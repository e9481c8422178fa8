// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV processing.

/// XML namespaces used in `CalDAV`.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// Apple iCal extension namespace (calendar color).
    pub const APPLE_ICAL: &str = "http://apple.com/ns/ical/";

    /// CalendarServer extension namespace (ctag).
    pub const CALENDAR_SERVER: &str = "http://calendarserver.org/ns/";
}

/// Extracts the numeric code from a `DAV:status` line.
///
/// Status lines have the shape `HTTP/<d>.<d> <code> <reason>`. A missing or
/// malformed code yields 0, which no success check matches.
#[must_use]
pub fn parse_status_code(status: &str) -> u16 {
    status
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

/// Whether a propstat status code denotes success.
#[must_use]
pub const fn is_success(code: u16) -> bool {
    code >= 200 && code < 300
}
