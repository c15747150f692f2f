//! Response classification
//!
//! Turns a failed exchange into exactly one typed `Error`. The diagnostic
//! envelope is parsed from the body when possible; every parse failure
//! degrades to a synthetic envelope instead of escalating.
//!
//! Status mapping, first match wins:
//! - 500 → Network (checked before body parsing, envelope built from raw text)
//! - 400 → BadRequest
//! - 401 → InvalidToken if the envelope flags the application token, else Unauthorized
//! - 403 → RateLimitExceeded if the message is the rate-limit text, else Unauthorized
//! - 404 → NotFound
//! - 429 → RateLimitExceeded
//! - 503 → ServiceUnavailable
//! - anything else, or no response at all → UnknownApi

use common::MessagesConfig;
use reqwest::StatusCode;
use tracing::{error, info, warn};

use crate::envelope::{ResourceError, ResponseEnvelope};
use crate::error::{Cause, Error, ErrorKind, Failure, Result};
use crate::response::HttpResponse;

/// Log level used for a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Info,
    Warn,
    Error,
}

/// Category for a 500, decided before the body is parsed.
const SERVER_ERROR: (ErrorKind, Severity) = (ErrorKind::Network, Severity::Error);

/// Maps completed responses and transport failures onto the error taxonomy.
#[derive(Debug, Clone)]
pub struct Classifier {
    unknown_error: String,
    rate_limit_exceeded: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&MessagesConfig::default())
    }
}

impl Classifier {
    pub fn new(messages: &MessagesConfig) -> Self {
        Self {
            unknown_error: messages.unknown_error.clone(),
            rate_limit_exceeded: messages.rate_limit_exceeded.clone(),
        }
    }

    /// Pass through anything below 400, classify the rest.
    pub fn check(&self, response: HttpResponse) -> Result<HttpResponse> {
        if response.status().as_u16() < 400 {
            return Ok(response);
        }
        Err(self.classify(Some(&response), None))
    }

    /// Classify a failure. `response` is `None` for transport failures.
    pub fn classify(&self, response: Option<&HttpResponse>, cause: Option<Cause>) -> Error {
        let error = match response {
            None => {
                let envelope = ResponseEnvelope::default();
                let cause_text = cause.as_ref().map(|c| c.to_string());
                error!(
                    status = %self.unknown_error,
                    cause = cause_text.as_deref().unwrap_or("<none>"),
                    "strava request failed without a response"
                );
                Error::UnknownApi(Failure::new(self.unknown_error.clone(), envelope, cause))
            }
            Some(response) => self.classify_response(response, cause),
        };

        metrics::counter!("strava_api_errors_total", "kind" => error.kind().as_str())
            .increment(1);
        error
    }

    fn classify_response(&self, response: &HttpResponse, cause: Option<Cause>) -> Error {
        let status = response.status_line();

        if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            let envelope = ResponseEnvelope::from_message(response.reason()).with_error(
                ResourceError::new(response.body_lossy(), None, response.status().as_str()),
            );
            let (kind, severity) = SERVER_ERROR;
            log(severity, &status, &envelope);
            return Error::new(kind, Failure::new(status, envelope, cause));
        }

        let envelope = parse_envelope(response, cause.as_ref());
        let (kind, severity) = self.kind_for(response.status(), &envelope);
        log(severity, &status, &envelope);
        Error::new(kind, Failure::new(status, envelope, cause))
    }

    fn kind_for(&self, status: StatusCode, envelope: &ResponseEnvelope) -> (ErrorKind, Severity) {
        match status.as_u16() {
            400 => (ErrorKind::BadRequest, Severity::Warn),
            401 if envelope.is_token_invalid() => (ErrorKind::InvalidToken, Severity::Info),
            401 => (ErrorKind::Unauthorized, Severity::Warn),
            403 if envelope.message_is(&self.rate_limit_exceeded) => {
                (ErrorKind::RateLimitExceeded, Severity::Warn)
            }
            403 => (ErrorKind::Unauthorized, Severity::Warn),
            404 => (ErrorKind::NotFound, Severity::Info),
            429 => (ErrorKind::RateLimitExceeded, Severity::Warn),
            503 => (ErrorKind::ServiceUnavailable, Severity::Error),
            _ => (ErrorKind::UnknownApi, Severity::Error),
        }
    }
}

/// Build the diagnostic envelope for a failed response.
///
/// - no body: message is the cause's description (unset without a cause)
/// - body that isn't an envelope: message is the raw body text
/// - body that isn't UTF-8: message is the cause, or the decoding error
pub fn parse_envelope(response: &HttpResponse, cause: Option<&Cause>) -> ResponseEnvelope {
    let Some(body) = response.body() else {
        return ResponseEnvelope {
            message: cause.map(|c| c.to_string()),
            errors: Vec::new(),
        };
    };

    let text = match std::str::from_utf8(body) {
        Ok(text) => text,
        Err(e) => {
            return ResponseEnvelope::from_message(
                cause.map_or_else(|| e.to_string(), |c| c.to_string()),
            );
        }
    };

    serde_json::from_str(text).unwrap_or_else(|_| ResponseEnvelope::from_message(text))
}

fn log(severity: Severity, status: &str, envelope: &ResponseEnvelope) {
    match severity {
        Severity::Info => info!(%status, %envelope, "strava request failed"),
        Severity::Warn => warn!(%status, %envelope, "strava request failed"),
        Severity::Error => error!(%status, %envelope, "strava request failed"),
    }
}
