// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Multistatus parsing tests.

use caldav_client::{CalDavError, MultiStatus, ns};

#[test]
fn response_parse_multistatus_basic() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/calendars/user/event1.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>\"12345\"</D:getetag>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");

    assert_eq!(multistatus.responses.len(), 1);
    let response = &multistatus.responses[0];
    assert_eq!(response.href, "/calendars/user/event1.ics");
    assert_eq!(response.propstats.len(), 1);
    assert_eq!(response.propstats[0].status, 200);
    assert_eq!(response.get_property("getetag", ns::DAV), Some("\"12345\""));
}

#[test]
fn response_parse_calendar_collection() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">
  <D:response>
    <D:href>/calendars/user/personal/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>My</D:displayname>
        <D:resourcetype>
          <D:collection/>
          <C:calendar/>
        </D:resourcetype>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let response = &multistatus.responses[0];

    assert_eq!(response.get_property("displayname", ns::DAV), Some("My"));
    assert!(response.is_calendar());
    assert!(response.is_collection());
}

#[test]
fn response_property_lookup_is_namespace_qualified() {
    // displayname in a foreign namespace must not satisfy a DAV: lookup
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\" xmlns:X=\"urn:example:other\">
  <D:response>
    <D:href>/a/</D:href>
    <D:propstat>
      <D:prop>
        <X:displayname>wrong</X:displayname>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let response = &multistatus.responses[0];

    assert_eq!(response.get_property("displayname", ns::DAV), None);
    assert_eq!(
        response.get_property("displayname", "urn:example:other"),
        Some("wrong")
    );
}

#[test]
fn response_failed_propstat_is_skipped() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/a/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname/>
      </D:prop>
      <D:status>HTTP/1.1 404 Not Found</D:status>
    </D:propstat>
    <D:propstat>
      <D:prop>
        <D:getetag>\"ok\"</D:getetag>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let response = &multistatus.responses[0];

    assert_eq!(response.get_property("displayname", ns::DAV), None);
    assert_eq!(response.get_property("getetag", ns::DAV), Some("\"ok\""));
}

#[test]
fn response_malformed_status_is_failure() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/a/</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>\"x\"</D:getetag>
      </D:prop>
      <D:status>garbled</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let response = &multistatus.responses[0];

    assert_eq!(response.propstats[0].status, 0);
    assert_eq!(response.get_property("getetag", ns::DAV), None);
}

#[test]
fn response_parse_calendar_home_set_subtree() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">
  <D:response>
    <D:href>/dav/principals/user/</D:href>
    <D:propstat>
      <D:prop>
        <C:calendar-home-set>
          <D:href>/dav/calendars/user/</D:href>
        </C:calendar-home-set>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let response = &multistatus.responses[0];

    let home = response
        .get_property_element("calendar-home-set", ns::CALDAV)
        .expect("Missing calendar-home-set");
    let href = home.child("href", ns::DAV).expect("Missing inner href");
    assert_eq!(href.text, "/dav/calendars/user/");
}

#[test]
fn response_supported_component_set_attributes() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">
  <D:response>
    <D:href>/calendars/user/personal/</D:href>
    <D:propstat>
      <D:prop>
        <C:supported-calendar-component-set>
          <C:comp name=\"VEVENT\"/>
          <C:comp name=\"VTODO\"/>
        </C:supported-calendar-component-set>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let set = multistatus.responses[0]
        .get_property_element("supported-calendar-component-set", ns::CALDAV)
        .expect("Missing component set");

    let names: Vec<&str> = set
        .children
        .iter()
        .filter(|c| c.is("comp", ns::CALDAV))
        .filter_map(|c| c.attribute("name"))
        .collect();
    assert_eq!(names, vec!["VEVENT", "VTODO"]);
}

#[test]
fn response_privileges_write_is_writable() {
    for grant in ["write", "write-content", "bind", "unbind", "all"] {
        let xml = format!(
            "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/cal/</D:href>
    <D:propstat>
      <D:prop>
        <D:current-user-privilege-set>
          <D:privilege><D:read/></D:privilege>
          <D:privilege><D:{grant}/></D:privilege>
        </D:current-user-privilege-set>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"
        );

        let multistatus = MultiStatus::parse(&xml).expect("Failed to parse multistatus");
        assert!(
            !multistatus.responses[0].is_read_only(),
            "privilege {grant} should grant write"
        );
    }
}

#[test]
fn response_privileges_read_only() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/cal/</D:href>
    <D:propstat>
      <D:prop>
        <D:current-user-privilege-set>
          <D:privilege><D:read/></D:privilege>
          <D:privilege><D:read-current-user-privilege-set/></D:privilege>
        </D:current-user-privilege-set>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    assert!(multistatus.responses[0].is_read_only());
}

#[test]
fn response_absent_privileges_is_writable() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/cal/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>No ACL here</D:displayname>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    assert!(!multistatus.responses[0].is_read_only());
}

#[test]
fn response_calendar_data_with_escaped_newlines() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">
  <D:response>
    <D:href>/calendars/user/event1.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>\"12345\"</D:getetag>
        <C:calendar-data>BEGIN:VCALENDAR&#13;&#10;BEGIN:VEVENT&#13;&#10;UID:1@example.com&#13;&#10;DTSTART:20250101T120000Z&#13;&#10;SUMMARY:Test Event&#13;&#10;END:VEVENT&#13;&#10;END:VCALENDAR&#13;&#10;</C:calendar-data>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let data = multistatus.responses[0]
        .get_property("calendar-data", ns::CALDAV)
        .expect("Missing calendar data");

    assert!(data.contains("BEGIN:VCALENDAR"));
    assert!(data.contains("SUMMARY:Test Event"));
}

#[test]
fn response_multiple_responses_keep_document_order() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/cal/a.ics</D:href>
  </D:response>
  <D:response>
    <D:href>/cal/b.ics</D:href>
  </D:response>
</D:multistatus>";

    let multistatus = MultiStatus::parse(xml).expect("Failed to parse multistatus");
    let hrefs: Vec<&str> = multistatus.responses.iter().map(|r| r.href.as_str()).collect();
    assert_eq!(hrefs, vec!["/cal/a.ics", "/cal/b.ics"]);
}

#[test]
fn response_malformed_xml_is_parse_error() {
    let truncated = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/cal/a.ics";

    let err = MultiStatus::parse(truncated).expect_err("Truncated XML must not parse");
    assert!(matches!(err, CalDavError::Parse(_)), "got {err:?}");
}

#[test]
fn response_wrong_root_is_parse_error() {
    let xml = "<D:prop xmlns:D=\"DAV:\"/>";

    let err = MultiStatus::parse(xml).expect_err("Wrong root must not parse");
    assert!(matches!(err, CalDavError::Parse(_)), "got {err:?}");
}
