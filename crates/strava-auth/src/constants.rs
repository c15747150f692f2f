//! Strava OAuth endpoint paths, relative to the configured base URL

/// Token endpoint for code exchange and token refresh
pub const TOKEN_PATH: &str = "/oauth/token";

/// Browser-facing authorization page
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Revokes an access token and all tokens issued with it
pub const DEAUTHORIZE_PATH: &str = "/oauth/deauthorize";
