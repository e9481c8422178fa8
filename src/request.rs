// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request body builders for WebDAV/CalDAV operations.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::CalDavError;
use crate::types::CalendarPatch;
use crate::xml::ns;

/// A property requested via PROPFIND.
#[derive(Debug, Clone)]
struct PropSpec {
    name: String,
    namespace: String,
    prefix: String,
}

/// PROPFIND request builder.
///
/// Accumulates (local-name, namespace, preferred-prefix) triples and emits a
/// complete XML document with a deduplicated set of namespace declarations.
#[derive(Debug, Default)]
pub struct PropFindRequest {
    props: Vec<PropSpec>,
}

impl PropFindRequest {
    /// Creates an empty PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self { props: Vec::new() }
    }

    /// Adds a property to the request.
    ///
    /// The preferred prefix is used when this property's namespace has not
    /// been declared by an earlier property.
    pub fn add_property(&mut self, name: &str, namespace: &str, prefix: &str) -> &mut Self {
        self.props.push(PropSpec {
            name: name.to_string(),
            namespace: namespace.to_string(),
            prefix: prefix.to_string(),
        });
        self
    }

    /// Preset: `current-user-principal`, used by discovery stage P and
    /// authentication verification.
    #[must_use]
    pub fn current_user_principal() -> Self {
        let mut req = Self::new();
        req.add_property("current-user-principal", ns::DAV, "D");
        req
    }

    /// Preset: `calendar-home-set` plus `displayname`, used by discovery
    /// stage H.
    #[must_use]
    pub fn calendar_home_set() -> Self {
        let mut req = Self::new();
        req.add_property("calendar-home-set", ns::CALDAV, "C");
        req.add_property("displayname", ns::DAV, "D");
        req
    }

    /// Preset: the full calendar property set used for listing and fetching
    /// calendar collections.
    #[must_use]
    pub fn calendar_properties() -> Self {
        let mut req = Self::new();
        req.add_property("resourcetype", ns::DAV, "D");
        req.add_property("displayname", ns::DAV, "D");
        req.add_property("calendar-description", ns::CALDAV, "C");
        req.add_property("calendar-timezone", ns::CALDAV, "C");
        req.add_property("supported-calendar-component-set", ns::CALDAV, "C");
        req.add_property("calendar-color", ns::APPLE_ICAL, "A");
        req.add_property("getctag", ns::CALENDAR_SERVER, "CS");
        req.add_property("current-user-privilege-set", ns::DAV, "D");
        req
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        // (prefix, namespace) pairs in declaration order; DAV is always first
        // and always prefixed D. First preferred prefix wins per namespace.
        let mut declarations: Vec<(String, String)> =
            vec![("D".to_string(), ns::DAV.to_string())];
        for prop in &self.props {
            if !declarations.iter().any(|(_, n)| n == &prop.namespace) {
                declarations.push((prop.prefix.clone(), prop.namespace.clone()));
            }
        }

        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut propfind = BytesStart::new("D:propfind");
        for (prefix, namespace) in &declarations {
            let attr = format!("xmlns:{prefix}");
            propfind.push_attribute((attr.as_str(), namespace.as_str()));
        }
        writer.write_event(Event::Start(propfind))?;

        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        for prop in &self.props {
            let tag = format!(
                "{}:{}",
                prefix_of(&declarations, &prop.namespace),
                prop.name
            );
            writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        writer.write_event(Event::End(BytesEnd::new("D:propfind")))?;

        into_string(writer)
    }
}

/// Time range filter for calendar queries, UTC basic format
/// (`YYYYMMDDTHHMMSSZ`).
#[derive(Debug, Clone, Default)]
pub struct TimeRange {
    /// Start instant, inclusive.
    pub start: Option<String>,
    /// End instant, exclusive.
    pub end: Option<String>,
}

/// Calendar query (REPORT) request builder.
#[derive(Debug)]
pub struct CalendarQueryRequest {
    component: String,
    time_range: Option<TimeRange>,
    uid: Option<String>,
}

impl CalendarQueryRequest {
    /// Creates a query for VEVENT components.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            component: String::new(),
            time_range: None,
            uid: None,
        }
    }

    /// Sets the component filter (VEVENT, VTODO, etc.). Defaults to VEVENT.
    #[must_use]
    pub fn component(mut self, component: String) -> Self {
        self.component = component;
        self
    }

    /// Sets the time range filter.
    #[must_use]
    pub fn time_range(mut self, start: Option<String>, end: Option<String>) -> Self {
        if start.is_some() || end.is_some() {
            self.time_range = Some(TimeRange { start, end });
        }
        self
    }

    /// Sets a UID text-match filter (`collation="i;octet"`).
    #[must_use]
    pub fn uid_match(mut self, uid: String) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let component = if self.component.is_empty() {
            "VEVENT"
        } else {
            &self.component
        };

        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut calendar_query = BytesStart::new("C:calendar-query");
        calendar_query.push_attribute(("xmlns:D", ns::DAV));
        calendar_query.push_attribute(("xmlns:C", ns::CALDAV));
        writer.write_event(Event::Start(calendar_query))?;

        write_report_prop(&mut writer)?;

        writer.write_event(Event::Start(BytesStart::new("C:filter")))?;

        let mut comp_filter = BytesStart::new("C:comp-filter");
        comp_filter.push_attribute(("name", "VCALENDAR"));
        writer.write_event(Event::Start(comp_filter))?;

        let mut comp_filter_inner = BytesStart::new("C:comp-filter");
        comp_filter_inner.push_attribute(("name", component));
        writer.write_event(Event::Start(comp_filter_inner))?;

        if let Some(tr) = &self.time_range {
            let mut time_range = BytesStart::new("C:time-range");
            if let Some(start) = &tr.start {
                time_range.push_attribute(("start", start.as_str()));
            }
            if let Some(end) = &tr.end {
                time_range.push_attribute(("end", end.as_str()));
            }
            writer.write_event(Event::Empty(time_range))?;
        }

        if let Some(uid) = &self.uid {
            let mut prop_filter = BytesStart::new("C:prop-filter");
            prop_filter.push_attribute(("name", "UID"));
            writer.write_event(Event::Start(prop_filter))?;

            let mut text_match = BytesStart::new("C:text-match");
            text_match.push_attribute(("collation", "i;octet"));
            writer.write_event(Event::Start(text_match))?;
            writer.write_event(Event::Text(BytesText::new(uid)))?;
            writer.write_event(Event::End(BytesEnd::new("C:text-match")))?;

            writer.write_event(Event::End(BytesEnd::new("C:prop-filter")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
        writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
        writer.write_event(Event::End(BytesEnd::new("C:filter")))?;
        writer.write_event(Event::End(BytesEnd::new("C:calendar-query")))?;

        into_string(writer)
    }
}

impl Default for CalendarQueryRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Calendar multiget (REPORT) request builder.
#[derive(Debug, Default)]
pub struct CalendarMultiGetRequest {
    hrefs: Vec<String>,
}

impl CalendarMultiGetRequest {
    /// Creates a new calendar multiget request.
    #[must_use]
    pub fn new() -> Self {
        Self { hrefs: Vec::new() }
    }

    /// Adds an href to the request.
    pub fn add_href(&mut self, href: String) -> &mut Self {
        self.hrefs.push(href);
        self
    }

    /// Builds the XML body for the calendar multiget request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut multiget = BytesStart::new("C:calendar-multiget");
        multiget.push_attribute(("xmlns:D", ns::DAV));
        multiget.push_attribute(("xmlns:C", ns::CALDAV));
        writer.write_event(Event::Start(multiget))?;

        write_report_prop(&mut writer)?;

        for href in &self.hrefs {
            writer.write_event(Event::Start(BytesStart::new("D:href")))?;
            writer.write_event(Event::Text(BytesText::new(href.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("D:href")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("C:calendar-multiget")))?;

        into_string(writer)
    }
}

/// MKCALENDAR request builder.
#[derive(Debug)]
pub struct MkCalendarRequest<'a> {
    display_name: &'a str,
    patch: &'a CalendarPatch,
}

impl<'a> MkCalendarRequest<'a> {
    /// Creates an MKCALENDAR body for a collection with the given display
    /// name and optional extra properties.
    #[must_use]
    pub const fn new(display_name: &'a str, patch: &'a CalendarPatch) -> Self {
        Self {
            display_name,
            patch,
        }
    }

    /// Builds the XML body for the MKCALENDAR request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut mkcalendar = BytesStart::new("C:mkcalendar");
        mkcalendar.push_attribute(("xmlns:D", ns::DAV));
        mkcalendar.push_attribute(("xmlns:C", ns::CALDAV));
        mkcalendar.push_attribute(("xmlns:A", ns::APPLE_ICAL));
        writer.write_event(Event::Start(mkcalendar))?;

        writer.write_event(Event::Start(BytesStart::new("D:set")))?;
        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;

        write_text_prop(&mut writer, "D:displayname", self.display_name)?;
        write_calendar_patch(&mut writer, self.patch)?;

        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
        writer.write_event(Event::End(BytesEnd::new("D:set")))?;
        writer.write_event(Event::End(BytesEnd::new("C:mkcalendar")))?;

        into_string(writer)
    }
}

/// PROPPATCH request builder.
#[derive(Debug)]
pub struct PropPatchRequest<'a> {
    patch: &'a CalendarPatch,
}

impl<'a> PropPatchRequest<'a> {
    /// Creates a PROPPATCH body carrying only the supplied fields.
    #[must_use]
    pub const fn new(patch: &'a CalendarPatch) -> Self {
        Self { patch }
    }

    /// Builds the XML body for the PROPPATCH request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut update = BytesStart::new("D:propertyupdate");
        update.push_attribute(("xmlns:D", ns::DAV));
        update.push_attribute(("xmlns:C", ns::CALDAV));
        update.push_attribute(("xmlns:A", ns::APPLE_ICAL));
        writer.write_event(Event::Start(update))?;

        writer.write_event(Event::Start(BytesStart::new("D:set")))?;
        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;

        if let Some(name) = &self.patch.display_name {
            write_text_prop(&mut writer, "D:displayname", name)?;
        }
        write_calendar_patch(&mut writer, self.patch)?;

        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
        writer.write_event(Event::End(BytesEnd::new("D:set")))?;
        writer.write_event(Event::End(BytesEnd::new("D:propertyupdate")))?;

        into_string(writer)
    }
}

/// Declared prefix for a namespace; DAV's `D` is the fallback.
fn prefix_of<'a>(declarations: &'a [(String, String)], namespace: &str) -> &'a str {
    declarations
        .iter()
        .find(|(_, n)| n == namespace)
        .map_or("D", |(p, _)| p.as_str())
}

fn write_text_prop<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &str,
) -> Result<(), CalDavError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Shared `<D:prop>` block of calendar-query and calendar-multiget: request
/// the etag and the calendar data of each matched resource.
fn write_report_prop<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), CalDavError> {
    writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
    writer.write_event(Event::Empty(BytesStart::new("D:getetag")))?;
    writer.write_event(Event::Empty(BytesStart::new("C:calendar-data")))?;
    writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
    Ok(())
}

/// Optional calendar properties shared by MKCALENDAR and PROPPATCH bodies.
fn write_calendar_patch<W: std::io::Write>(
    writer: &mut Writer<W>,
    patch: &CalendarPatch,
) -> Result<(), CalDavError> {
    if let Some(desc) = &patch.description {
        write_text_prop(writer, "C:calendar-description", desc)?;
    }
    if let Some(color) = &patch.color {
        write_text_prop(writer, "A:calendar-color", color)?;
    }
    if let Some(tz) = &patch.timezone {
        write_text_prop(writer, "C:calendar-timezone", tz)?;
    }
    if let Some(components) = &patch.supported_components {
        writer.write_event(Event::Start(BytesStart::new(
            "C:supported-calendar-component-set",
        )))?;
        for comp in components {
            let mut el = BytesStart::new("C:comp");
            el.push_attribute(("name", comp.as_str()));
            writer.write_event(Event::Empty(el))?;
        }
        writer.write_event(Event::End(BytesEnd::new(
            "C:supported-calendar-component-set",
        )))?;
    }
    Ok(())
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> Result<String, CalDavError> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| CalDavError::Parse(format!("UTF-8 error: {e}")))
}
