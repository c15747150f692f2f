//! Transport-neutral view of a completed HTTP exchange
//!
//! The client buffers the body before anything inspects the response, so
//! observers and the classifier see the same immutable snapshot.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Failure, Result};

/// A completed response: status, headers and the buffered body if one could
/// be read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase; empty for non-standard codes.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// `"<code> <reason>"`, e.g. `"404 Not Found"`.
    pub fn status_line(&self) -> String {
        let reason = self.reason();
        if reason.is_empty() {
            self.status.as_str().to_owned()
        } else {
            format!("{} {}", self.status.as_str(), reason)
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Body as text, replacing invalid UTF-8. Empty when there is no body.
    pub fn body_lossy(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Deserialize a success body.
    ///
    /// A missing or malformed body is reported as `UnknownApi` with the raw
    /// text as the envelope message.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let Some(body) = self.body.as_ref() else {
            warn!(status = %self.status_line(), "response has no body to decode");
            return Err(Error::UnknownApi(Failure::new(
                self.status_line(),
                ResponseEnvelope::from_message("empty response body"),
                None,
            )));
        };

        serde_json::from_slice(body).map_err(|e| {
            warn!(status = %self.status_line(), error = %e, "failed to decode response body");
            Error::UnknownApi(Failure::new(
                self.status_line(),
                ResponseEnvelope::from_message(self.body_lossy()),
                Some(Arc::new(e)),
            ))
        })
    }
}
