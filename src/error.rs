// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// `CalDAV` client errors.
#[non_exhaustive]
#[derive(Debug)]
pub enum CalDavError {
    /// Protocol-level failure not covered by a more specific kind.
    Protocol {
        /// Human-readable description of the failure.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
        /// Response body, when one was captured.
        body: Option<String>,
    },

    /// Authentication rejected by the server (HTTP 401).
    Authentication(String),

    /// Resource not found (HTTP 404).
    NotFound(String),

    /// Conflicting state on the server (HTTP 409 or 412).
    Conflict(String),

    /// Endpoint discovery failed.
    Discovery(String),

    /// Malformed XML or iCalendar payload.
    Parse(String),

    /// Plaintext URL without explicit opt-in.
    InsecureConnection(String),
}

impl CalDavError {
    /// Creates a catch-all protocol error without status or body.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Translates an HTTP status into the matching error kind.
    ///
    /// Recognized statuses map to the specific kinds; everything else becomes
    /// a [`CalDavError::Protocol`] with the status and body preserved.
    #[must_use]
    pub fn from_status(status: u16, context: &str, body: Option<String>) -> Self {
        match status {
            401 => Self::Authentication(format!("{context}: authentication required")),
            404 => Self::NotFound(context.to_string()),
            409 | 412 => Self::Conflict(context.to_string()),
            _ => Self::Protocol {
                message: format!("{context}: unexpected status {status}"),
                status: Some(status),
                body,
            },
        }
    }

    /// HTTP status carried by this error, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => *status,
            Self::Authentication(_) => Some(401),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl fmt::Display for CalDavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol {
                message,
                status: Some(code),
                ..
            } => write!(f, "Protocol error ({code}): {message}"),
            Self::Protocol { message, .. } => write!(f, "Protocol error: {message}"),
            Self::Authentication(e) => write!(f, "Authentication failed: {e}"),
            Self::NotFound(e) => write!(f, "Resource not found: {e}"),
            Self::Conflict(e) => write!(f, "Conflict: {e}"),
            Self::Discovery(e) => write!(f, "Discovery failed: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::InsecureConnection(e) => write!(f, "Insecure connection refused: {e}"),
        }
    }
}

impl std::error::Error for CalDavError {}

impl From<reqwest::Error> for CalDavError {
    fn from(e: reqwest::Error) -> Self {
        Self::Protocol {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
            body: None,
        }
    }
}

impl From<quick_xml::Error> for CalDavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<url::ParseError> for CalDavError {
    fn from(e: url::ParseError) -> Self {
        Self::protocol(format!("invalid URL: {e}"))
    }
}

impl From<std::io::Error> for CalDavError {
    fn from(e: std::io::Error) -> Self {
        Self::Parse(format!("IO error: {e}"))
    }
}
