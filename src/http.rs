// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and WebDAV method support.

use reqwest::{Client, Method, RequestBuilder, redirect};
use url::Url;

use crate::config::{AuthMethod, CalDavConfig};
use crate::error::CalDavError;
use crate::types::ETag;

/// Captured HTTP exchange result.
///
/// The transport does not interpret status codes; any status below 500 is
/// handed to the services for protocol-specific handling.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// `ETag` response header, when present.
    pub etag: Option<ETag>,
    /// `Location` response header, when present.
    pub location: Option<String>,
    /// `DAV` response header, when present.
    pub dav: Option<String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status denotes success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Write precondition headers.
#[derive(Debug, Clone)]
pub enum Precondition {
    /// `If-Match: <etag>`, for updates against a known version.
    IfMatch(ETag),
    /// `If-None-Match: *`, for create-if-absent.
    IfNoneMatchAny,
}

/// HTTP client for `CalDAV` operations.
///
/// Redirects are disabled so that discovery can observe 3xx responses.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: CalDavConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client, config })
    }

    /// Issues a PROPFIND with the given depth and XML body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn propfind(
        &self,
        url: &Url,
        depth: u8,
        body: String,
    ) -> Result<HttpResponse, CalDavError> {
        let req = self
            .request(dav_method("PROPFIND")?, url)
            .header("Depth", depth.to_string())
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(body);
        self.execute("PROPFIND", req).await
    }

    /// Issues a REPORT with the given depth and XML body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn report(
        &self,
        url: &Url,
        depth: u8,
        body: String,
    ) -> Result<HttpResponse, CalDavError> {
        let req = self
            .request(dav_method("REPORT")?, url)
            .header("Depth", depth.to_string())
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(body);
        self.execute("REPORT", req).await
    }

    /// Issues a PROPPATCH with the given XML body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn proppatch(&self, url: &Url, body: String) -> Result<HttpResponse, CalDavError> {
        let req = self
            .request(dav_method("PROPPATCH")?, url)
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(body);
        self.execute("PROPPATCH", req).await
    }

    /// Issues an MKCALENDAR; no content type header is sent for an empty
    /// body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn mkcalendar(
        &self,
        url: &Url,
        body: Option<String>,
    ) -> Result<HttpResponse, CalDavError> {
        let mut req = self.request(dav_method("MKCALENDAR")?, url);
        if let Some(body) = body {
            req = req
                .header("Content-Type", "application/xml; charset=utf-8")
                .body(body);
        }
        self.execute("MKCALENDAR", req).await
    }

    /// Issues a PUT of iCalendar data with an optional precondition.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn put(
        &self,
        url: &Url,
        body: String,
        precondition: Option<Precondition>,
    ) -> Result<HttpResponse, CalDavError> {
        let mut req = self
            .request(Method::PUT, url)
            .header("Content-Type", "text/calendar; charset=utf-8")
            .body(body);
        req = apply_precondition(req, precondition);
        self.execute("PUT", req).await
    }

    /// Issues a DELETE with an optional `If-Match` precondition.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn delete(
        &self,
        url: &Url,
        etag: Option<&ETag>,
    ) -> Result<HttpResponse, CalDavError> {
        let precondition = etag.cloned().map(Precondition::IfMatch);
        let req = apply_precondition(self.request(Method::DELETE, url), precondition);
        self.execute("DELETE", req).await
    }

    /// Issues a GET.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn get(&self, url: &Url) -> Result<HttpResponse, CalDavError> {
        self.execute("GET", self.request(Method::GET, url)).await
    }

    /// Issues an OPTIONS.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a 5xx status.
    pub async fn options(&self, url: &Url) -> Result<HttpResponse, CalDavError> {
        self.execute("OPTIONS", self.request(Method::OPTIONS, url))
            .await
    }

    /// Builds a request with authentication headers.
    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let mut req = self.client.request(method, url.clone());

        match &self.config.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::Bearer { token } => {
                req = req.bearer_auth(token);
            }
            AuthMethod::None => {}
        }

        req
    }

    /// Executes a request and captures the exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails at the transport level or the
    /// server answers with a 5xx status.
    async fn execute(&self, method: &str, req: RequestBuilder) -> Result<HttpResponse, CalDavError> {
        let resp = req.send().await?;

        let status = resp.status().as_u16();
        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let etag = header("ETag").map(ETag::new);
        let location = header("Location");
        let dav = header("DAV");

        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        tracing::debug!(method, status, "request completed");

        if status >= 500 {
            return Err(CalDavError::Protocol {
                message: format!("{method}: server error"),
                status: Some(status),
                body: Some(body),
            });
        }

        Ok(HttpResponse {
            status,
            etag,
            location,
            dav,
            body,
        })
    }
}

fn apply_precondition(req: RequestBuilder, precondition: Option<Precondition>) -> RequestBuilder {
    match precondition {
        Some(Precondition::IfMatch(etag)) => req.header("If-Match", etag.as_str()),
        Some(Precondition::IfNoneMatchAny) => req.header("If-None-Match", "*"),
        None => req,
    }
}

fn dav_method(name: &str) -> Result<Method, CalDavError> {
    Method::from_bytes(name.as_bytes())
        .map_err(|e| CalDavError::protocol(format!("invalid method: {e}")))
}
