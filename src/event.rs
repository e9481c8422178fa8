// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Event (VEVENT resource) operations with ETag-based optimistic
//! concurrency.

use std::sync::Arc;

use jiff::Timestamp;
use url::Url;

use crate::error::CalDavError;
use crate::http::{HttpClient, Precondition};
use crate::ical;
use crate::request::{CalendarMultiGetRequest, CalendarQueryRequest};
use crate::response::MultiStatus;
use crate::types::{Calendar, CalendarEvent, ETag, Href};
use crate::xml::ns;

/// Event service; operates on calendars returned by the calendar service.
#[derive(Debug, Clone)]
pub struct EventService {
    http: Arc<HttpClient>,
}

impl EventService {
    /// Creates an event service on the shared transport.
    #[must_use]
    pub const fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Lists the events of a calendar, optionally limited to a UTC time
    /// range.
    ///
    /// Issues a `calendar-query` REPORT. Servers that honor the filter but
    /// omit `calendar-data` from the response are handled by a single
    /// follow-up `calendar-multiget` on the returned `.ics` hrefs, which
    /// preserves the server-side selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails or the response is malformed.
    #[tracing::instrument(skip(self, calendar), fields(calendar = %calendar.href))]
    pub async fn list(
        &self,
        calendar: &Calendar,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<CalendarEvent>, CalDavError> {
        let body = CalendarQueryRequest::new()
            .time_range(start.map(ical::format_utc), end.map(ical::format_utc))
            .build()?;

        let url = Url::parse(calendar.href.as_str())?;
        let resp = self.http.report(&url, 1, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                "event query failed",
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;
        let (events, fallback_hrefs) = extract_events(calendar, &url, &multistatus)?;
        if events.is_empty() && !fallback_hrefs.is_empty() {
            // Some major providers filter correctly but omit calendar-data;
            // their hrefs are already the filtered selection.
            tracing::warn!(
                hrefs = fallback_hrefs.len(),
                "server omitted calendar-data; issuing calendar-multiget"
            );
            return self.multi_get(calendar, &fallback_hrefs).await;
        }
        Ok(events)
    }

    /// Fetches multiple events by URL via `calendar-multiget`.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails or the response is malformed.
    #[tracing::instrument(skip(self, calendar, urls), fields(calendar = %calendar.href))]
    pub async fn multi_get(
        &self,
        calendar: &Calendar,
        urls: &[String],
    ) -> Result<Vec<CalendarEvent>, CalDavError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = CalendarMultiGetRequest::new();
        for url in urls {
            request.add_href(url.clone());
        }
        let body = request.build()?;

        let url = Url::parse(calendar.href.as_str())?;
        let resp = self.http.report(&url, 1, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                "event multiget failed",
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;
        let (events, _) = extract_events(calendar, &url, &multistatus)?;
        Ok(events)
    }

    /// Finds one event by its iCalendar UID.
    ///
    /// Uses a `calendar-query` with a UID `text-match` (`i;octet`); servers
    /// that answer with hrefs only are handled by the multiget fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails or the response is malformed.
    #[tracing::instrument(skip(self, calendar), fields(calendar = %calendar.href))]
    pub async fn find_by_uid(
        &self,
        calendar: &Calendar,
        uid: &str,
    ) -> Result<Option<CalendarEvent>, CalDavError> {
        let body = CalendarQueryRequest::new()
            .uid_match(uid.to_string())
            .build()?;

        let url = Url::parse(calendar.href.as_str())?;
        let resp = self.http.report(&url, 1, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                "event lookup failed",
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;
        let (mut events, fallback_hrefs) = extract_events(calendar, &url, &multistatus)?;
        if events.is_empty() && !fallback_hrefs.is_empty() {
            tracing::warn!(
                hrefs = fallback_hrefs.len(),
                "server omitted calendar-data; issuing calendar-multiget"
            );
            events = self.multi_get(calendar, &fallback_hrefs).await?;
        }
        Ok(events.into_iter().find(|e| e.uid == uid))
    }

    /// Creates an event at `<calendar>/<uid>.ics`, failing if the resource
    /// already exists.
    ///
    /// Returns the event with its href and the server-assigned `ETag` set.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Conflict`] when the resource already exists.
    #[tracing::instrument(skip(self, calendar, event), fields(uid = %event.uid))]
    pub async fn create(
        &self,
        calendar: &Calendar,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, CalDavError> {
        let url = Url::parse(calendar.href.as_str())?.join(&format!("{}.ics", event.uid))?;
        let body = ical::serialize_event(event);

        let resp = self
            .http
            .put(&url, body.clone(), Some(Precondition::IfNoneMatchAny))
            .await?;

        match resp.status {
            412 => Err(CalDavError::Conflict("Event already exists".to_string())),
            status if (200..300).contains(&status) => {
                let mut created = event.clone();
                created.calendar_id = calendar.uid.clone();
                created.href = Some(Href::new(url.to_string()));
                created.etag = resp.etag;
                created.raw_icalendar = Some(body);
                Ok(created)
            }
            status => Err(CalDavError::from_status(
                status,
                "event creation failed",
                Some(resp.body),
            )),
        }
    }

    /// Updates an existing event in place.
    ///
    /// Sends `If-Match` with the event's `ETag`; without one the update
    /// degrades to last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Conflict`] when the server copy changed since
    /// the event was fetched, [`CalDavError::NotFound`] when it is gone.
    #[tracing::instrument(skip(self, event), fields(uid = %event.uid))]
    pub async fn update(&self, event: &CalendarEvent) -> Result<CalendarEvent, CalDavError> {
        let href = event
            .href
            .as_ref()
            .ok_or_else(|| CalDavError::protocol("event has no href; create it first"))?;
        let url = Url::parse(href.as_str())?;

        let precondition = event.etag.clone().map(Precondition::IfMatch);
        if precondition.is_none() {
            tracing::warn!(uid = %event.uid, "updating without an ETag, last writer wins");
        }

        let body = ical::serialize_event(event);
        let resp = self.http.put(&url, body.clone(), precondition).await?;

        match resp.status {
            412 => Err(CalDavError::Conflict(
                "Event was modified by another client; refetch and re-apply".to_string(),
            )),
            404 => Err(CalDavError::NotFound(href.to_string())),
            status if (200..300).contains(&status) => {
                let mut updated = event.clone();
                updated.etag = resp.etag;
                updated.raw_icalendar = Some(body);
                Ok(updated)
            }
            status => Err(CalDavError::from_status(
                status,
                "event update failed",
                Some(resp.body),
            )),
        }
    }

    /// Deletes an event. Deletion is idempotent: a 404 answer is success.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Conflict`] when the server copy changed since
    /// the event was fetched.
    #[tracing::instrument(skip(self, event), fields(uid = %event.uid))]
    pub async fn delete(&self, event: &CalendarEvent) -> Result<(), CalDavError> {
        let href = event
            .href
            .as_ref()
            .ok_or_else(|| CalDavError::protocol("event has no href; nothing to delete"))?;
        let url = Url::parse(href.as_str())?;

        let resp = self.http.delete(&url, event.etag.as_ref()).await?;
        match resp.status {
            404 => Ok(()),
            412 => Err(CalDavError::Conflict(
                "Event was modified by another client; refetch and re-apply".to_string(),
            )),
            status if (200..300).contains(&status) => Ok(()),
            status => Err(CalDavError::from_status(
                status,
                "event deletion failed",
                Some(resp.body),
            )),
        }
    }
}

/// Extracts events from a multistatus. Responses without `calendar-data` but
/// with an `.ics` href are collected as multiget fallback candidates.
fn extract_events(
    calendar: &Calendar,
    base: &Url,
    multistatus: &MultiStatus,
) -> Result<(Vec<CalendarEvent>, Vec<String>), CalDavError> {
    let mut events = Vec::new();
    let mut fallback_hrefs = Vec::new();

    for response in &multistatus.responses {
        let data = response
            .get_property("calendar-data", ns::CALDAV)
            .filter(|d| !d.trim().is_empty());

        match data {
            Some(data) => {
                if let Some(mut event) =
                    ical::parse_event(&calendar.uid, data, calendar.is_read_only)
                {
                    if !response.href.is_empty() {
                        event.href = Some(Href::new(base.join(&response.href)?.to_string()));
                    }
                    event.etag = response
                        .get_property("getetag", ns::DAV)
                        .map(|e| ETag::new(e.to_string()));
                    events.push(event);
                }
            }
            None if response.href.ends_with(".ics") => {
                fallback_hrefs.push(response.href.clone());
            }
            None => {}
        }
    }

    Ok((events, fallback_hrefs))
}
