// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint discovery (RFC 6764): well-known → principal → calendar home.

use std::sync::Arc;

use url::Url;

use crate::error::CalDavError;
use crate::http::HttpClient;
use crate::request::PropFindRequest;
use crate::response::MultiStatus;
use crate::types::DiscoveryResult;
use crate::xml::ns;

/// Resolves the `CalDAV` endpoints for one server/account.
///
/// Three stages, each feeding its successor; a stage failure halts the
/// stages after it.
#[derive(Debug, Clone)]
pub struct DiscoveryService {
    http: Arc<HttpClient>,
}

impl DiscoveryService {
    /// Creates a discovery service on the shared transport.
    #[must_use]
    pub const fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Runs the full three-stage discovery from a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Discovery`] when a stage cannot produce its
    /// URL, or the translated transport error of the failing request.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self, base: &Url) -> Result<DiscoveryResult, CalDavError> {
        let caldav_endpoint = self.resolve_well_known(base).await?;
        tracing::debug!(endpoint = %caldav_endpoint, "well-known stage resolved");

        let principal_url = self.resolve_principal(&caldav_endpoint).await?;
        tracing::debug!(principal = %principal_url, "principal stage resolved");

        let (calendar_home_set, display_name) =
            self.resolve_calendar_home(&principal_url).await?;
        tracing::debug!(home = %calendar_home_set, "calendar home stage resolved");

        Ok(DiscoveryResult {
            caldav_endpoint,
            principal_url,
            calendar_home_set,
            display_name,
        })
    }

    /// Checks whether the configured credentials are accepted.
    ///
    /// A PROPFIND for `current-user-principal` at the base URL: 207 means
    /// authenticated, 401 means not.
    ///
    /// # Errors
    ///
    /// Returns an error for any other outcome.
    pub async fn verify_auth(&self, base: &Url) -> Result<bool, CalDavError> {
        let body = PropFindRequest::current_user_principal().build()?;
        let resp = self.http.propfind(base, 0, body).await?;
        match resp.status {
            207 => Ok(true),
            401 => Ok(false),
            status => Err(CalDavError::from_status(
                status,
                "authentication check failed",
                Some(resp.body),
            )),
        }
    }

    /// Stage W: GET `<base>/.well-known/caldav` with redirects disabled.
    ///
    /// 3xx follows the `Location`; 200 keeps the well-known URL; 404 and 401
    /// fall back to the base URL.
    async fn resolve_well_known(&self, base: &Url) -> Result<Url, CalDavError> {
        let well_known = base.join("/.well-known/caldav")?;
        let resp = self.http.get(&well_known).await?;

        match resp.status {
            300..=399 => {
                let location = resp.location.ok_or_else(|| {
                    CalDavError::Discovery(
                        "well-known redirect carried no Location header".to_string(),
                    )
                })?;
                Ok(base.join(&location)?)
            }
            200 => Ok(well_known),
            404 | 401 => Ok(base.clone()),
            status => Err(CalDavError::from_status(
                status,
                "well-known lookup failed",
                Some(resp.body),
            )),
        }
    }

    /// Stage P: resolve `current-user-principal` against the endpoint.
    async fn resolve_principal(&self, endpoint: &Url) -> Result<Url, CalDavError> {
        let body = PropFindRequest::current_user_principal().build()?;
        let resp = self.http.propfind(endpoint, 0, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                "principal lookup failed",
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;
        let href = multistatus
            .responses
            .iter()
            .find_map(|r| {
                r.get_property_element("current-user-principal", ns::DAV)
                    .and_then(|el| el.child("href", ns::DAV))
                    .map(|h| h.text.trim().to_string())
            })
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                CalDavError::Discovery("current-user-principal not found".to_string())
            })?;

        Ok(endpoint.join(&href)?)
    }

    /// Stage H: resolve `calendar-home-set` against the principal URL; the
    /// principal display name is captured opportunistically.
    async fn resolve_calendar_home(
        &self,
        principal: &Url,
    ) -> Result<(Url, Option<String>), CalDavError> {
        let body = PropFindRequest::calendar_home_set().build()?;
        let resp = self.http.propfind(principal, 0, body).await?;
        if resp.status != 207 {
            return Err(CalDavError::from_status(
                resp.status,
                "calendar home lookup failed",
                Some(resp.body),
            ));
        }

        let multistatus = MultiStatus::parse(&resp.body)?;

        let display_name = multistatus
            .responses
            .iter()
            .find_map(|r| r.get_property("displayname", ns::DAV))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let href = multistatus
            .responses
            .iter()
            .find_map(|r| {
                r.get_property_element("calendar-home-set", ns::CALDAV)
                    .and_then(|el| el.child("href", ns::DAV))
                    .map(|h| h.text.trim().to_string())
            })
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CalDavError::Discovery("calendar-home-set not found".to_string()))?;

        let mut home = principal.join(&href)?;
        ensure_trailing_slash(&mut home);
        Ok((home, display_name))
    }
}

/// Collection URLs always end with a slash so that joins stay inside them.
pub(crate) fn ensure_trailing_slash(url: &mut Url) {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
}
