//! OAuth token exchange, refresh and revocation
//!
//! Code exchange and refresh both POST to `TOKEN_PATH`; only the grant type
//! and the credential field differ. Failures are classified like any other
//! Strava call: a missing field comes back as 400 BadRequest, a wrong client
//! secret as 401 Unauthorized.

use common::{ClientConfig, Secret};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use strava_api::{Error, Failure, ResourceError, ResponseEnvelope, Result, StravaClient};
use tracing::{info, warn};

use crate::constants::{DEAUTHORIZE_PATH, TOKEN_PATH};

/// Registered application identity.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: u64,
    pub client_secret: Secret<String>,
}

impl ClientCredentials {
    pub fn new(client_id: u64, client_secret: impl Into<Secret<String>>) -> Self {
        Self {
            client_id,
            client_secret: client_secret.into(),
        }
    }

    /// Take the identity from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> common::Result<Self> {
        let client_id = config
            .client_id
            .ok_or_else(|| common::Error::Config("client.client_id is not set".into()))?;
        let client_secret = config.client_secret.clone().ok_or_else(|| {
            common::Error::Config(
                "client secret not set (STRAVA_CLIENT_SECRET or client.client_secret_file)".into(),
            )
        })?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

/// What is being traded for an access token.
#[derive(Debug, Clone)]
pub enum TokenGrant {
    /// Code from the authorization redirect
    AuthorizationCode(String),
    /// Refresh token from a previous exchange
    RefreshToken(String),
}

impl TokenGrant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            TokenGrant::AuthorizationCode(_) => "authorization_code",
            TokenGrant::RefreshToken(_) => "refresh_token",
        }
    }

    /// Form field name and value carrying the credential.
    fn credential(&self) -> (&'static str, &str) {
        match self {
            TokenGrant::AuthorizationCode(code) => ("code", code),
            TokenGrant::RefreshToken(token) => ("refresh_token", token),
        }
    }
}

/// Minimal athlete profile returned with the first token exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AthleteSummary {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    /// Profile picture URL
    #[serde(default)]
    pub profile: Option<String>,
}

/// Response from the token endpoint for both exchange and refresh.
///
/// `athlete` is only present on authorization code exchange.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds at which the access token expires
    pub expires_at: i64,
    /// Seconds until the access token expires
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athlete: Option<AthleteSummary>,
}

/// Trade an authorization code or refresh token for an access token.
///
/// A blank code or refresh token is rejected locally as BadRequest without
/// contacting Strava.
pub async fn exchange_token(
    client: &StravaClient,
    credentials: &ClientCredentials,
    grant: TokenGrant,
) -> Result<TokenResponse> {
    let (field, value) = grant.credential();
    if value.trim().is_empty() {
        return Err(missing_field(field));
    }

    let client_id = credentials.client_id.to_string();
    let request = client.request(Method::POST, TOKEN_PATH).form(&[
        ("client_id", client_id.as_str()),
        ("client_secret", credentials.client_secret.expose().as_str()),
        ("grant_type", grant.grant_type()),
        (field, value),
    ]);

    let token: TokenResponse = client.execute_json(request).await?;
    info!(
        grant_type = grant.grant_type(),
        athlete_id = token.athlete.as_ref().map(|a| a.id),
        expires_at = token.expires_at,
        "token exchange succeeded"
    );
    Ok(token)
}

/// Revoke an access token.
pub async fn deauthorise(client: &StravaClient, access_token: &Secret<String>) -> Result<()> {
    if access_token.is_blank() {
        return Err(missing_field("access_token"));
    }

    let request = client
        .request(Method::POST, DEAUTHORIZE_PATH)
        .form(&[("access_token", access_token.expose().as_str())]);
    client.execute(request).await?;
    info!("access token revoked");
    Ok(())
}

/// BadRequest for a required field the caller left empty, shaped like
/// Strava's own response for the same mistake.
fn missing_field(field: &str) -> Error {
    let envelope = ResponseEnvelope::from_message("Bad Request")
        .with_error(ResourceError::new("Application", Some(field), "missing"));
    warn!(field, "rejecting token request with missing field");
    Error::BadRequest(Failure::new("400 Bad Request", envelope, None))
}
