//! Typed failures for Strava API calls
//!
//! Every failed exchange ends up as exactly one `Error` variant. Each variant
//! carries a `Failure`: the status summary, the diagnostic envelope (never
//! absent, a synthetic one is substituted when the body can't be parsed), and
//! the transport-level cause if there was one.

use std::fmt;
use std::sync::Arc;

use crate::envelope::ResponseEnvelope;

/// Shared transport-level cause. `Arc` so errors stay cheap to clone and
/// callers can check identity with `Arc::ptr_eq`.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Context attached to every typed error.
#[derive(Debug, Clone)]
pub struct Failure {
    status: String,
    envelope: ResponseEnvelope,
    cause: Option<Cause>,
}

impl Failure {
    pub fn new(status: impl Into<String>, envelope: ResponseEnvelope, cause: Option<Cause>) -> Self {
        Self {
            status: status.into(),
            envelope,
            cause,
        }
    }

    /// `"<code> <reason>"`, or the unknown-error sentinel when no response
    /// was received.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.envelope, f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Failure category, used for metrics labels and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    InvalidToken,
    NotFound,
    RateLimitExceeded,
    Network,
    ServiceUnavailable,
    UnknownApi,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidToken => "invalid_token",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::Network => "network",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::UnknownApi => "unknown_api",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of a failed Strava API call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// 400: the request was malformed or missing required fields
    #[error("bad request: {}", .0.status())]
    BadRequest(#[source] Failure),

    /// 401/403 without a more specific diagnosis
    #[error("unauthorized: {}", .0.status())]
    Unauthorized(#[source] Failure),

    /// 401 where Strava reports the application token itself as invalid
    #[error("invalid access token: {}", .0.status())]
    InvalidToken(#[source] Failure),

    #[error("not found: {}", .0.status())]
    NotFound(#[source] Failure),

    /// 429, or 403 carrying the rate-limit message
    #[error("rate limit exceeded: {}", .0.status())]
    RateLimitExceeded(#[source] Failure),

    /// 500 from Strava
    #[error("network error: {}", .0.status())]
    Network(#[source] Failure),

    #[error("service unavailable: {}", .0.status())]
    ServiceUnavailable(#[source] Failure),

    /// No response at all, or a status the classifier doesn't recognise
    #[error("unknown API error: {}", .0.status())]
    UnknownApi(#[source] Failure),
}

impl Error {
    pub fn new(kind: ErrorKind, failure: Failure) -> Self {
        match kind {
            ErrorKind::BadRequest => Error::BadRequest(failure),
            ErrorKind::Unauthorized => Error::Unauthorized(failure),
            ErrorKind::InvalidToken => Error::InvalidToken(failure),
            ErrorKind::NotFound => Error::NotFound(failure),
            ErrorKind::RateLimitExceeded => Error::RateLimitExceeded(failure),
            ErrorKind::Network => Error::Network(failure),
            ErrorKind::ServiceUnavailable => Error::ServiceUnavailable(failure),
            ErrorKind::UnknownApi => Error::UnknownApi(failure),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::InvalidToken(_) => ErrorKind::InvalidToken,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::Network(_) => ErrorKind::Network,
            Error::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Error::UnknownApi(_) => ErrorKind::UnknownApi,
        }
    }

    pub fn failure(&self) -> &Failure {
        match self {
            Error::BadRequest(f)
            | Error::Unauthorized(f)
            | Error::InvalidToken(f)
            | Error::NotFound(f)
            | Error::RateLimitExceeded(f)
            | Error::Network(f)
            | Error::ServiceUnavailable(f)
            | Error::UnknownApi(f) => f,
        }
    }

    pub fn status(&self) -> &str {
        self.failure().status()
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        self.failure().envelope()
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.failure().cause()
    }

    /// Worth retrying later with the same credentials.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimitExceeded | ErrorKind::ServiceUnavailable | ErrorKind::Network
        )
    }

    /// The access token must be refreshed before retrying.
    pub fn requires_reauthorization(&self) -> bool {
        self.kind() == ErrorKind::InvalidToken
    }
}

/// Result alias for Strava API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResourceError;
    use std::error::Error as _;

    const ALL_KINDS: [ErrorKind; 8] = [
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::InvalidToken,
        ErrorKind::NotFound,
        ErrorKind::RateLimitExceeded,
        ErrorKind::Network,
        ErrorKind::ServiceUnavailable,
        ErrorKind::UnknownApi,
    ];

    #[test]
    fn accessors_return_supplied_values() {
        let envelope = ResponseEnvelope::from_message("Bad Request")
            .with_error(ResourceError::new("Application", Some("code"), "missing"));
        let cause: Cause = Arc::new(std::io::Error::other("connection reset"));

        for kind in ALL_KINDS {
            let err = Error::new(
                kind,
                Failure::new("400 Bad Request", envelope.clone(), Some(cause.clone())),
            );
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status(), "400 Bad Request");
            assert_eq!(err.envelope(), &envelope);
            assert!(Arc::ptr_eq(err.cause().unwrap(), &cause));
        }
    }

    #[test]
    fn empty_failure_is_preserved() {
        let err = Error::BadRequest(Failure::new("", ResponseEnvelope::default(), None));
        assert_eq!(err.status(), "");
        assert_eq!(err.envelope(), &ResponseEnvelope::default());
        assert!(err.cause().is_none());
        assert!(err.source().unwrap().source().is_none());
    }

    #[test]
    fn source_chain_reaches_cause() {
        let cause: Cause = Arc::new(std::io::Error::other("timed out"));
        let err = Error::UnknownApi(Failure::new(
            "Unknown error",
            ResponseEnvelope::from_message("timed out"),
            Some(cause),
        ));
        assert_eq!(err.to_string(), "unknown API error: Unknown error");

        let failure = err.source().unwrap();
        assert_eq!(failure.to_string(), "timed out");
        assert_eq!(failure.source().unwrap().to_string(), "timed out");
    }

    #[test]
    fn retry_and_reauthorization_hints() {
        let failure = || Failure::new("x", ResponseEnvelope::default(), None);
        let retryable: Vec<_> = ALL_KINDS
            .into_iter()
            .filter(|k| Error::new(*k, failure()).is_retryable())
            .collect();
        assert_eq!(
            retryable,
            vec![
                ErrorKind::RateLimitExceeded,
                ErrorKind::Network,
                ErrorKind::ServiceUnavailable
            ]
        );
        assert!(Error::InvalidToken(failure()).requires_reauthorization());
        assert!(!Error::Unauthorized(failure()).requires_reauthorization());
    }

    #[test]
    fn kind_labels_are_distinct() {
        let labels: std::collections::HashSet<_> = ALL_KINDS.iter().map(|k| k.as_str()).collect();
        assert_eq!(labels.len(), ALL_KINDS.len());
    }
}
