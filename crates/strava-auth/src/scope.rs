//! OAuth scopes and the authorization page URL

use std::fmt;

use reqwest::Url;
use strava_api::StravaClient;

use crate::constants::AUTHORIZE_PATH;

/// Access levels an application can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorisationScope {
    /// Public segments, routes, profile data, posts, events, club feeds and leaderboards
    Read,
    /// Private routes, segments and events
    ReadAll,
    /// All profile information, even under "Only You" visibility
    ProfileReadAll,
    /// Update weight, FTP and starred segments
    ProfileWrite,
    /// Activities visible to Everyone and Followers
    ActivityRead,
    /// Activities including "Only You" visibility and privacy zone data
    ActivityReadAll,
    /// Create, upload and edit activities
    ActivityWrite,
}

impl AuthorisationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorisationScope::Read => "read",
            AuthorisationScope::ReadAll => "read_all",
            AuthorisationScope::ProfileReadAll => "profile:read_all",
            AuthorisationScope::ProfileWrite => "profile:write",
            AuthorisationScope::ActivityRead => "activity:read",
            AuthorisationScope::ActivityReadAll => "activity:read_all",
            AuthorisationScope::ActivityWrite => "activity:write",
        }
    }
}

impl fmt::Display for AuthorisationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether Strava should re-show the consent screen to an athlete who has
/// already authorized the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalPrompt {
    #[default]
    Auto,
    Force,
}

impl ApprovalPrompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalPrompt::Auto => "auto",
            ApprovalPrompt::Force => "force",
        }
    }
}

/// Build the authorization page URL the athlete opens in a browser.
///
/// `state` is returned unchanged in the redirect and should be checked by
/// the caller. No request is made, so a base URL that doesn't parse is a
/// configuration error rather than an API failure.
pub fn authorization_url(
    client: &StravaClient,
    client_id: u64,
    redirect_uri: &str,
    approval_prompt: ApprovalPrompt,
    scopes: &[AuthorisationScope],
    state: Option<&str>,
) -> common::Result<Url> {
    let client_id = client_id.to_string();
    let scope = scopes
        .iter()
        .map(AuthorisationScope::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut params = vec![
        ("client_id", client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
        ("approval_prompt", approval_prompt.as_str()),
    ];
    if !scope.is_empty() {
        params.push(("scope", scope.as_str()));
    }
    if let Some(state) = state {
        params.push(("state", state));
    }

    let base = format!("{}{AUTHORIZE_PATH}", client.base_url());
    Url::parse_with_params(&base, &params)
        .map_err(|e| common::Error::Config(format!("invalid authorization URL {base}: {e}")))
}
