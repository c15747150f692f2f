//! Strava v3 API response handling
//!
//! Every call made through `StravaClient` passes through two independent
//! stages once the response arrives:
//! - observers (the `QuotaTracker` among them) read the headers of every
//!   completed response, success or failure
//! - the `Classifier` turns failures into one of eight typed `Error`
//!   variants, carrying Strava's diagnostic `ResponseEnvelope`
//!
//! Both stages are synchronous and run on the task that received the
//! response.

pub mod classifier;
pub mod client;
pub mod envelope;
pub mod error;
pub mod quota;
pub mod response;

pub use classifier::{Classifier, parse_envelope};
pub use client::StravaClient;
pub use envelope::{ResourceError, ResponseEnvelope};
pub use error::{Cause, Error, ErrorKind, Failure, Result};
pub use quota::{QuotaState, QuotaTracker};
pub use response::HttpResponse;

/// Hook invoked by the client on every completed exchange, before
/// classification.
///
/// Implementations must not block: they run inline on the task that
/// received the response.
pub trait ResponseObserver: Send + Sync {
    fn on_response(&self, response: &HttpResponse);
}
