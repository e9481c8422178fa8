// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client façade: authentication, cached discovery, and typed
//! calendar/event operations.

use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::RwLock;
use url::Url;

use crate::calendar::CalendarService;
use crate::config::CalDavConfig;
use crate::discovery::DiscoveryService;
use crate::error::CalDavError;
use crate::event::EventService;
use crate::http::HttpClient;
use crate::types::{
    Calendar, CalendarEvent, CalendarPatch, DiscoveryResult, ServerCapabilities,
};

/// `CalDAV` client for accessing and managing calendars on `CalDAV` servers.
///
/// Discovery runs lazily on the first calendar or event call and the result
/// is cached for the lifetime of the client; concurrent first calls may race
/// on discovery, which is idempotent.
///
/// # Example
///
/// ```ignore
/// use caldav_client::{AuthMethod, CalDavClient, CalDavConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CalDavConfig {
///     base_url: "https://caldav.example.com".to_string(),
///     auth: AuthMethod::Basic {
///         username: "user".to_string(),
///         password: "pass".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = CalDavClient::connect(config).await?;
/// let calendars = client.get_calendars().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CalDavClient {
    http: Arc<HttpClient>,
    base_url: Url,
    discovery: RwLock<Option<DiscoveryResult>>,
}

impl CalDavClient {
    /// Creates a new `CalDAV` client without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::InsecureConnection`] for a plain-`http` base
    /// URL unless `allow_insecure` is set, or an error if the URL is invalid
    /// or HTTP client initialization fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        let base_url = Url::parse(&config.base_url)?;

        match base_url.scheme() {
            "https" => {}
            "http" if config.allow_insecure => {}
            "http" => {
                return Err(CalDavError::InsecureConnection(format!(
                    "{base_url} uses plain http; use https or set allow_insecure"
                )));
            }
            scheme => {
                return Err(CalDavError::protocol(format!(
                    "unsupported URL scheme: {scheme}"
                )));
            }
        }

        let http = HttpClient::new(config)?;
        Ok(Self {
            http: Arc::new(http),
            base_url,
            discovery: RwLock::new(None),
        })
    }

    /// Builds a client, verifies the credentials, and runs discovery.
    ///
    /// Any failure closes the partially-built client before returning.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Authentication`] when the server rejects the
    /// credentials, or the failing step's error.
    pub async fn connect(config: CalDavConfig) -> Result<Self, CalDavError> {
        let client = Self::new(config)?;

        match client.verify_auth().await {
            Ok(true) => {}
            Ok(false) => {
                let err = CalDavError::Authentication("credentials rejected".to_string());
                client.close();
                return Err(err);
            }
            Err(err) => {
                client.close();
                return Err(err);
            }
        }

        if let Err(err) = client.discover().await {
            client.close();
            return Err(err);
        }

        Ok(client)
    }

    /// Checks whether the configured credentials are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error when the check cannot be performed.
    pub async fn verify_auth(&self) -> Result<bool, CalDavError> {
        DiscoveryService::new(Arc::clone(&self.http))
            .verify_auth(&self.base_url)
            .await
    }

    /// Resolves (or returns the cached) `CalDAV` endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Discovery`] when any stage fails.
    pub async fn discover(&self) -> Result<DiscoveryResult, CalDavError> {
        if let Some(result) = self.discovery.read().await.as_ref() {
            return Ok(result.clone());
        }

        let result = DiscoveryService::new(Arc::clone(&self.http))
            .discover(&self.base_url)
            .await?;

        *self.discovery.write().await = Some(result.clone());
        Ok(result)
    }

    /// Drops the cached discovery result; the next call re-discovers.
    pub async fn clear_discovery_cache(&self) {
        *self.discovery.write().await = None;
    }

    /// Probes server capabilities via OPTIONS on the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the OPTIONS request fails.
    pub async fn check_support(&self) -> Result<ServerCapabilities, CalDavError> {
        let resp = self.http.options(&self.base_url).await?;
        Ok(ServerCapabilities::from_dav_header(
            resp.dav.as_deref().unwrap_or(""),
        ))
    }

    /// Lists the calendar collections of the calendar home.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or the listing fails.
    pub async fn get_calendars(&self) -> Result<Vec<Calendar>, CalDavError> {
        self.calendars().await?.list().await
    }

    /// Fetches a single calendar collection by URL.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::NotFound`] when the resource is missing or is
    /// not a calendar.
    pub async fn get_calendar(&self, url: &str) -> Result<Calendar, CalDavError> {
        let url = Url::parse(url)?;
        self.calendars().await?.get(&url).await
    }

    /// Creates a calendar collection under the calendar home.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn create_calendar(
        &self,
        name: &str,
        patch: &CalendarPatch,
    ) -> Result<Calendar, CalDavError> {
        self.calendars().await?.create(name, patch).await
    }

    /// Updates calendar properties, returning the refreshed calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_calendar(
        &self,
        calendar: &Calendar,
        patch: &CalendarPatch,
    ) -> Result<Calendar, CalDavError> {
        self.calendars().await?.update(calendar, patch).await
    }

    /// Deletes a calendar collection.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::NotFound`] when the calendar is already gone.
    pub async fn delete_calendar(&self, calendar: &Calendar) -> Result<(), CalDavError> {
        self.calendars().await?.delete(calendar).await
    }

    /// Lists the events of a calendar, optionally limited to a UTC time
    /// range.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_events(
        &self,
        calendar: &Calendar,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<CalendarEvent>, CalDavError> {
        self.events().await?.list(calendar, start, end).await
    }

    /// Finds one event by its iCalendar UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub async fn get_event_by_uid(
        &self,
        calendar: &Calendar,
        uid: &str,
    ) -> Result<Option<CalendarEvent>, CalDavError> {
        self.events().await?.find_by_uid(calendar, uid).await
    }

    /// Fetches multiple events by URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the multiget fails.
    pub async fn get_events_by_urls(
        &self,
        calendar: &Calendar,
        urls: &[String],
    ) -> Result<Vec<CalendarEvent>, CalDavError> {
        self.events().await?.multi_get(calendar, urls).await
    }

    /// Creates an event, failing if one with the same UID already exists.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Conflict`] when the resource already exists.
    pub async fn create_event(
        &self,
        calendar: &Calendar,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, CalDavError> {
        self.events().await?.create(calendar, event).await
    }

    /// Updates an existing event, guarded by its `ETag` when present.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Conflict`] when the server copy changed.
    pub async fn update_event(&self, event: &CalendarEvent) -> Result<CalendarEvent, CalDavError> {
        self.events().await?.update(event).await
    }

    /// Deletes an event; already-deleted events are treated as success.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Conflict`] when the server copy changed.
    pub async fn delete_event(&self, event: &CalendarEvent) -> Result<(), CalDavError> {
        self.events().await?.delete(event).await
    }

    /// Releases the underlying transport.
    pub fn close(self) {
        drop(self);
    }

    async fn calendars(&self) -> Result<CalendarService, CalDavError> {
        let discovery = self.discover().await?;
        Ok(CalendarService::new(
            Arc::clone(&self.http),
            discovery.calendar_home_set,
        ))
    }

    async fn events(&self) -> Result<EventService, CalDavError> {
        // Events operate on absolute hrefs, but the protocol flow still goes
        // façade -> discovery -> service; the cache makes repeats free.
        self.discover().await?;
        Ok(EventService::new(Arc::clone(&self.http)))
    }
}
