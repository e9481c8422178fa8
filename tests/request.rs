// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request building tests.

use caldav_client::{
    CalendarMultiGetRequest, CalendarQueryRequest, CalendarPatch, MkCalendarRequest,
    PropFindRequest, PropPatchRequest, ns,
};

#[test]
fn request_propfind_builds_xml() {
    let mut request = PropFindRequest::new();
    request.add_property("displayname", ns::DAV, "D");
    request.add_property("resourcetype", ns::DAV, "D");

    let xml = request.build().expect("Failed to build PROPFIND XML");

    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<D:propfind"));
    assert!(xml.contains("xmlns:D=\"DAV:\""));
    assert!(xml.contains("<D:prop>"));
    assert!(xml.contains("<D:displayname/>"));
    assert!(xml.contains("<D:resourcetype/>"));
    assert!(xml.contains("</D:prop>"));
    assert!(xml.contains("</D:propfind>"));
}

#[test]
fn request_propfind_deduplicates_namespaces() {
    let mut request = PropFindRequest::new();
    request.add_property("calendar-description", ns::CALDAV, "C");
    request.add_property("calendar-timezone", ns::CALDAV, "C");
    request.add_property("getctag", ns::CALENDAR_SERVER, "CS");

    let xml = request.build().expect("Failed to build PROPFIND XML");

    assert_eq!(xml.matches("xmlns:C=\"urn:ietf:params:xml:ns:caldav\"").count(), 1);
    assert_eq!(xml.matches("xmlns:CS=\"http://calendarserver.org/ns/\"").count(), 1);
    assert!(xml.contains("<C:calendar-description/>"));
    assert!(xml.contains("<C:calendar-timezone/>"));
    assert!(xml.contains("<CS:getctag/>"));
}

#[test]
fn request_propfind_always_declares_dav() {
    let request = PropFindRequest::new();
    let xml = request.build().expect("Failed to build PROPFIND XML");
    assert!(xml.contains("xmlns:D=\"DAV:\""));
}

#[test]
fn request_propfind_preset_current_user_principal() {
    let xml = PropFindRequest::current_user_principal()
        .build()
        .expect("Failed to build PROPFIND XML");
    assert!(xml.contains("<D:current-user-principal/>"));
}

#[test]
fn request_propfind_preset_calendar_home_set() {
    let xml = PropFindRequest::calendar_home_set()
        .build()
        .expect("Failed to build PROPFIND XML");
    assert!(xml.contains("<C:calendar-home-set/>"));
    assert!(xml.contains("<D:displayname/>"));
}

#[test]
fn request_propfind_preset_calendar_properties() {
    let xml = PropFindRequest::calendar_properties()
        .build()
        .expect("Failed to build PROPFIND XML");

    assert!(xml.contains("<D:resourcetype/>"));
    assert!(xml.contains("<D:displayname/>"));
    assert!(xml.contains("<C:calendar-description/>"));
    assert!(xml.contains("<C:calendar-timezone/>"));
    assert!(xml.contains("<C:supported-calendar-component-set/>"));
    assert!(xml.contains("<A:calendar-color/>"));
    assert!(xml.contains("<CS:getctag/>"));
    assert!(xml.contains("<D:current-user-privilege-set/>"));
    assert!(xml.contains("xmlns:A=\"http://apple.com/ns/ical/\""));
}

#[test]
fn request_calendar_query_builds_xml() {
    let request = CalendarQueryRequest::new().time_range(
        Some("20250101T000000Z".to_string()),
        Some("20250131T235959Z".to_string()),
    );

    let xml = request.build().expect("Failed to build calendar-query XML");

    assert!(xml.contains("<C:calendar-query"));
    assert!(xml.contains("<D:getetag/>"));
    assert!(xml.contains("<C:calendar-data/>"));
    assert!(xml.contains("<C:filter>"));
    assert!(xml.contains("<C:comp-filter name=\"VCALENDAR\">"));
    assert!(xml.contains("<C:comp-filter name=\"VEVENT\">"));
    assert!(xml.contains("<C:time-range"));
    assert!(xml.contains("start=\"20250101T000000Z\""));
    assert!(xml.contains("end=\"20250131T235959Z\""));
}

#[test]
fn request_calendar_query_without_range_has_no_time_range() {
    let request = CalendarQueryRequest::new();
    let xml = request.build().expect("Failed to build calendar-query XML");

    assert!(xml.contains("<C:comp-filter name=\"VEVENT\">"));
    assert!(!xml.contains("<C:time-range"));
}

#[test]
fn request_calendar_query_uid_match() {
    let request = CalendarQueryRequest::new().uid_match("event-123".to_string());
    let xml = request.build().expect("Failed to build calendar-query XML");

    assert!(xml.contains("<C:prop-filter name=\"UID\">"));
    assert!(xml.contains("<C:text-match collation=\"i;octet\">event-123</C:text-match>"));
}

#[test]
fn request_calendar_query_uid_match_is_xml_escaped() {
    let request = CalendarQueryRequest::new().uid_match("a&b<c>d".to_string());
    let xml = request.build().expect("Failed to build calendar-query XML");

    assert!(xml.contains("a&amp;b&lt;c&gt;d"));
    assert!(!xml.contains("a&b<c>d"));
}

#[test]
fn request_calendar_multiget_builds_xml() {
    let mut request = CalendarMultiGetRequest::new();
    request.add_href("/calendars/user/event1.ics".to_string());
    request.add_href("/calendars/user/event2.ics".to_string());

    let xml = request
        .build()
        .expect("Failed to build calendar-multiget XML");

    assert!(xml.contains("<C:calendar-multiget"));
    assert!(xml.contains("<D:getetag/>"));
    assert!(xml.contains("<C:calendar-data/>"));
    assert!(xml.contains("<D:href>/calendars/user/event1.ics</D:href>"));
    assert!(xml.contains("<D:href>/calendars/user/event2.ics</D:href>"));
}

#[test]
fn request_calendar_multiget_escapes_hrefs() {
    let mut request = CalendarMultiGetRequest::new();
    request.add_href("/calendars/user/a&b.ics".to_string());

    let xml = request
        .build()
        .expect("Failed to build calendar-multiget XML");
    assert!(xml.contains("<D:href>/calendars/user/a&amp;b.ics</D:href>"));
}

#[test]
fn request_mkcalendar_builds_xml() {
    let patch = CalendarPatch {
        description: Some("Team events".to_string()),
        color: Some("#FF0000".to_string()),
        timezone: Some("Europe/Berlin".to_string()),
        supported_components: Some(vec!["VEVENT".to_string(), "VTODO".to_string()]),
        ..Default::default()
    };

    let xml = MkCalendarRequest::new("Team Calendar", &patch)
        .build()
        .expect("Failed to build MKCALENDAR XML");

    assert!(xml.contains("<C:mkcalendar"));
    assert!(xml.contains("<D:set>"));
    assert!(xml.contains("<D:prop>"));
    assert!(xml.contains("<D:displayname>Team Calendar</D:displayname>"));
    assert!(xml.contains("<C:calendar-description>Team events</C:calendar-description>"));
    assert!(xml.contains("<A:calendar-color>#FF0000</A:calendar-color>"));
    assert!(xml.contains("<C:calendar-timezone>Europe/Berlin</C:calendar-timezone>"));
    assert!(xml.contains("<C:comp name=\"VEVENT\"/>"));
    assert!(xml.contains("<C:comp name=\"VTODO\"/>"));
}

#[test]
fn request_mkcalendar_minimal() {
    let patch = CalendarPatch::default();
    let xml = MkCalendarRequest::new("Plain", &patch)
        .build()
        .expect("Failed to build MKCALENDAR XML");

    assert!(xml.contains("<D:displayname>Plain</D:displayname>"));
    assert!(!xml.contains("calendar-description"));
    assert!(!xml.contains("calendar-color"));
}

#[test]
fn request_proppatch_only_supplied_fields() {
    let patch = CalendarPatch {
        display_name: Some("Renamed".to_string()),
        color: Some("#00FF00AA".to_string()),
        ..Default::default()
    };

    let xml = PropPatchRequest::new(&patch)
        .build()
        .expect("Failed to build PROPPATCH XML");

    assert!(xml.contains("<D:propertyupdate"));
    assert!(xml.contains("<D:set>"));
    assert!(xml.contains("<D:displayname>Renamed</D:displayname>"));
    assert!(xml.contains("<A:calendar-color>#00FF00AA</A:calendar-color>"));
    assert!(!xml.contains("calendar-description"));
    assert!(!xml.contains("calendar-timezone"));
    assert!(!xml.contains("supported-calendar-component-set"));
}
