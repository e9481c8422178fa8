// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for accessing and managing calendars on `CalDAV` servers
//! (RFC 4791), with endpoint auto-discovery (RFC 6764) and iCalendar
//! (RFC 5545) payload handling.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod calendar;
mod client;
mod config;
mod discovery;
mod error;
mod event;
mod http;
pub mod ical;
mod request;
mod response;
mod types;
mod xml;

pub use crate::calendar::CalendarService;
pub use crate::client::CalDavClient;
pub use crate::config::{AuthMethod, CalDavConfig};
pub use crate::discovery::DiscoveryService;
pub use crate::error::CalDavError;
pub use crate::event::EventService;
pub use crate::http::{HttpClient, HttpResponse, Precondition};
pub use crate::request::{
    CalendarMultiGetRequest, CalendarQueryRequest, MkCalendarRequest, PropFindRequest,
    PropPatchRequest, TimeRange,
};
pub use crate::response::{DavResponse, Element, MultiStatus, PropStat};
pub use crate::types::{
    Calendar, CalendarEvent, CalendarPatch, DiscoveryResult, ETag, Href, ServerCapabilities,
};
pub use crate::xml::ns;
