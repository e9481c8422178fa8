// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendar collection operations.

use std::sync::Arc;

use url::Url;

use crate::discovery::ensure_trailing_slash;
use crate::error::CalDavError;
use crate::http::HttpClient;
use crate::request::{MkCalendarRequest, PropFindRequest, PropPatchRequest};
use crate::response::{DavResponse, MultiStatus};
use crate::types::{Calendar, CalendarPatch, Href};
use crate::xml::ns;

/// Calendar collection service, bound to one calendar home.
#[derive(Debug, Clone)]
pub struct CalendarService {
    http: Arc<HttpClient>,
    home: Url,
}

impl CalendarService {
    /// Creates a calendar service for the given calendar home collection.
    #[must_use]
    pub fn new(http: Arc<HttpClient>, mut home: Url) -> Self {
        ensure_trailing_slash(&mut home);
        Self { http, home }
    }

    /// Lists the calendar collections under the calendar home.
    ///
    /// Collections lacking the calendar resource type are skipped, as is the
    /// home itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPFIND fails or the response is malformed.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Calendar>, CalDavError> {
        let body = PropFindRequest::calendar_properties().build()?;
        let resp = self.http.propfind(&self.home, 1, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                "calendar listing failed",
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;
        let home_path = self.home.path().trim_end_matches('/').to_string();

        let mut calendars = Vec::new();
        for response in &multistatus.responses {
            let url = self.home.join(&response.href)?;
            if url.path().trim_end_matches('/') == home_path {
                continue;
            }
            if !response.is_calendar() {
                continue;
            }
            calendars.push(parse_calendar(response, url));
        }

        tracing::debug!(count = calendars.len(), "calendars listed");
        Ok(calendars)
    }

    /// Fetches a single calendar collection.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::NotFound`] when the resource is missing or is
    /// not a calendar.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &Url) -> Result<Calendar, CalDavError> {
        let body = PropFindRequest::calendar_properties().build()?;
        let resp = self.http.propfind(url, 0, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                &format!("calendar fetch failed: {url}"),
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;
        let response = multistatus
            .responses
            .first()
            .ok_or_else(|| CalDavError::NotFound(url.to_string()))?;
        if !response.is_calendar() {
            return Err(CalDavError::NotFound(format!("not a calendar: {url}")));
        }

        let resolved = self.home.join(&response.href)?;
        Ok(parse_calendar(response, resolved))
    }

    /// Creates a calendar collection at `<home>/<sanitized-name>/`.
    ///
    /// The returned calendar is re-fetched so it carries server-assigned
    /// fields (uid, ctag, privileges).
    ///
    /// # Errors
    ///
    /// Returns an error if MKCALENDAR fails; a 405 reports that the calendar
    /// already exists or creation is not allowed.
    #[tracing::instrument(skip(self, patch))]
    pub async fn create(
        &self,
        name: &str,
        patch: &CalendarPatch,
    ) -> Result<Calendar, CalDavError> {
        let slug = sanitize_name(name);
        if slug.is_empty() {
            return Err(CalDavError::protocol(format!(
                "calendar name sanitizes to nothing: {name:?}"
            )));
        }

        let url = self.home.join(&format!("{slug}/"))?;
        let body = MkCalendarRequest::new(name, patch).build()?;
        let resp = self.http.mkcalendar(&url, Some(body)).await?;

        match resp.status {
            status if (200..300).contains(&status) => self.get(&url).await,
            405 => Err(CalDavError::Protocol {
                message: "Calendar already exists or creation not allowed".to_string(),
                status: Some(405),
                body: Some(resp.body),
            }),
            status => Err(CalDavError::from_status(
                status,
                "calendar creation failed",
                Some(resp.body),
            )),
        }
    }

    /// Updates calendar properties via PROPPATCH, sending only the supplied
    /// fields, and returns the refreshed calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPPATCH fails.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        calendar: &Calendar,
        patch: &CalendarPatch,
    ) -> Result<Calendar, CalDavError> {
        let url = Url::parse(calendar.href.as_str())?;
        let body = PropPatchRequest::new(patch).build()?;
        let resp = self.http.proppatch(&url, body).await?;

        if resp.status == 207 || resp.is_success() {
            self.get(&url).await
        } else {
            Err(CalDavError::from_status(
                resp.status,
                &format!("calendar update failed: {}", calendar.href),
                Some(resp.body),
            ))
        }
    }

    /// Deletes a calendar collection.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::NotFound`] when the calendar is already gone.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, calendar: &Calendar) -> Result<(), CalDavError> {
        let url = Url::parse(calendar.href.as_str())?;
        let resp = self.http.delete(&url, None).await?;

        if resp.is_success() {
            Ok(())
        } else {
            Err(CalDavError::from_status(
                resp.status,
                &format!("calendar deletion failed: {}", calendar.href),
                Some(resp.body),
            ))
        }
    }
}

/// Builds a [`Calendar`] from one multistatus response.
fn parse_calendar(response: &DavResponse, mut url: Url) -> Calendar {
    ensure_trailing_slash(&mut url);

    let mut calendar = Calendar::new(Href::new(url.to_string()));
    // Servers rarely publish a collection identifier; the path is stable
    // across listings and serves as the uid.
    calendar.uid = url.path().to_string();

    let text = |name: &str, namespace: &str| {
        response
            .get_property(name, namespace)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(name) = text("displayname", ns::DAV) {
        calendar.display_name = name;
    }
    calendar.description = text("calendar-description", ns::CALDAV);
    calendar.color = text("calendar-color", ns::APPLE_ICAL);
    calendar.timezone = text("calendar-timezone", ns::CALDAV);
    calendar.ctag = text("getctag", ns::CALENDAR_SERVER);

    if let Some(set) = response.get_property_element("supported-calendar-component-set", ns::CALDAV)
    {
        let components: Vec<String> = set
            .children
            .iter()
            .filter(|c| c.is("comp", ns::CALDAV))
            .filter_map(|c| c.attribute("name"))
            .map(str::to_string)
            .collect();
        if !components.is_empty() {
            calendar.supported_components = components;
        }
    }

    calendar.is_read_only = response.is_read_only();

    calendar
}

/// Sanitizes a display name into a collection path segment: lowercase,
/// `[a-z0-9-]` only, runs of `-` collapsed, no leading/trailing `-`.
fn sanitize_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}
