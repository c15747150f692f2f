//! HTTP client wrapper that routes every exchange through the observers and
//! the classifier.

use std::sync::Arc;
use std::time::Duration;

use common::StravaConfig;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::ResponseObserver;
use crate::classifier::Classifier;
use crate::error::{Cause, Result};
use crate::quota::{QuotaState, QuotaTracker};
use crate::response::HttpResponse;

/// Strava API client.
///
/// Each completed response is buffered, shown to every observer (the quota
/// tracker always first), then checked: anything ≥ 400 is classified into a
/// typed error. Transport failures are classified with no response.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    classifier: Classifier,
    quota: Arc<QuotaTracker>,
    observers: Vec<Arc<dyn ResponseObserver>>,
}

impl StravaClient {
    /// Build a client with its own quota tracker from configuration.
    pub fn from_config(config: &StravaConfig) -> common::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|e| common::Error::Config(format!("failed to build HTTP client: {e}")))?;
        let quota = Arc::new(QuotaTracker::new(&config.rate_limit)?);
        Ok(Self::new(http, config, quota))
    }

    /// Build a client around an existing reqwest client and a shared
    /// tracker, so several clients can report into one quota.
    pub fn new(http: reqwest::Client, config: &StravaConfig, quota: Arc<QuotaTracker>) -> Self {
        Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_owned(),
            classifier: Classifier::new(&config.messages),
            observers: vec![quota.clone() as Arc<dyn ResponseObserver>],
            quota,
        }
    }

    /// Register an additional observer, run after the quota tracker.
    pub fn with_observer(mut self, observer: Arc<dyn ResponseObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn quota(&self) -> QuotaState {
        self.quota.snapshot()
    }

    pub fn quota_tracker(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Start a request against `path`, relative to the configured base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http.request(method, url)
    }

    /// Send a request and return the buffered response if it succeeded.
    pub async fn execute(&self, request: RequestBuilder) -> Result<HttpResponse> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "strava request failed before a response arrived");
                return Err(self.classifier.classify(None, Some(Arc::new(e))));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let mut cause: Option<Cause> = None;
        let mut completed = HttpResponse::new(status).with_headers(headers);
        match response.bytes().await {
            Ok(body) if body.is_empty() => {}
            Ok(body) => completed = completed.with_body(body),
            Err(e) => {
                warn!(status = %status, error = %e, "failed to read strava response body");
                cause = Some(Arc::new(e));
            }
        }
        debug!(status = %status, "strava response received");

        for observer in &self.observers {
            observer.on_response(&completed);
        }

        if cause.is_some() {
            return Err(self.classifier.classify(Some(&completed), cause));
        }
        self.classifier.check(completed)
    }

    /// Send a request and decode the success body.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.execute(request).await?.json()
    }
}
