//! Strava OAuth authentication
//!
//! Credential flow:
//! 1. Send the athlete to `authorization_url()` with the scopes needed
//! 2. Strava redirects back with an authorization code
//! 3. `exchange_token()` with `TokenGrant::AuthorizationCode` returns the
//!    first access/refresh token pair and an athlete summary
//! 4. Before `expires_at`, `exchange_token()` with `TokenGrant::RefreshToken`
//! 5. `deauthorise()` revokes access
//!
//! All calls go through `StravaClient`, so failures come back as the same
//! typed errors as every other API call and update the shared quota.

pub mod constants;
pub mod scope;
pub mod token;

pub use constants::*;
pub use scope::{ApprovalPrompt, AuthorisationScope, authorization_url};
pub use token::{
    AthleteSummary, ClientCredentials, TokenGrant, TokenResponse, deauthorise, exchange_token,
};
