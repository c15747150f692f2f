//! Client configuration types and loading
//!
//! Every section is optional; a missing file section falls back to the
//! defaults Strava itself uses. The client secret is loaded from the
//! STRAVA_CLIENT_SECRET env var or `client_secret_file`, never stored in
//! the TOML directly.

use crate::{Error, Result, Secret};
use reqwest::header::HeaderName;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StravaConfig {
    pub api: ApiConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub messages: MessagesConfig,
    pub client: ClientConfig,
}

/// Transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.strava.com".into(),
            timeout_secs: 30,
        }
    }
}

/// Names of the response headers carrying quota data.
///
/// Both headers hold a `short,daily` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RateLimitConfig {
    pub usage_header_name: String,
    pub limit_header_name: String,
}

impl RateLimitConfig {
    pub fn usage_header(&self) -> Result<HeaderName> {
        parse_header_name("usage-header-name", &self.usage_header_name)
    }

    pub fn limit_header(&self) -> Result<HeaderName> {
        parse_header_name("limit-header-name", &self.limit_header_name)
    }
}

fn parse_header_name(key: &'static str, name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::InvalidHeaderName {
        key,
        name: name.to_owned(),
    })
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            usage_header_name: "X-RateLimit-Usage".into(),
            limit_header_name: "X-RateLimit-Limit".into(),
        }
    }
}

/// Fixed strings the classifier compares against or reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MessagesConfig {
    /// Status reported when no HTTP response was received at all
    pub unknown_error: String,
    /// Message Strava puts in a 403 body when the quota is exhausted
    pub rate_limit_exceeded: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            unknown_error: "Unknown error".into(),
            rate_limit_exceeded: "Rate Limit Exceeded".into(),
        }
    }
}

/// Registered application identity
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub client_id: Option<u64>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret
    pub client_secret_file: Option<PathBuf>,
}

impl StravaConfig {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. STRAVA_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;

        if let Ok(secret) = std::env::var("STRAVA_CLIENT_SECRET") {
            config.client.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.client.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.client.client_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Parse and validate a TOML document without touching the environment.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: StravaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".into()));
        }

        self.rate_limit.usage_header()?;
        self.rate_limit.limit_header()?;

        Ok(())
    }

    /// Resolve config file path from CLI arg or STRAVA_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("STRAVA_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("strava.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn full_toml() -> &'static str {
        r#"
[api]
base_url = "http://127.0.0.1:9000"
timeout_secs = 5

[rate-limit]
usage-header-name = "ratelimit-usage"
limit-header-name = "ratelimit-limit"

[messages]
unknown-error = "No response"
rate-limit-exceeded = "Quota gone"

[client]
client_id = 5
"#
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = StravaConfig::parse("").unwrap();
        assert_eq!(config.api.base_url, "https://www.strava.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.rate_limit.usage_header_name, "X-RateLimit-Usage");
        assert_eq!(config.rate_limit.limit_header_name, "X-RateLimit-Limit");
        assert_eq!(config.messages.unknown_error, "Unknown error");
        assert_eq!(config.messages.rate_limit_exceeded, "Rate Limit Exceeded");
        assert!(config.client.client_id.is_none());
    }

    #[test]
    fn parses_every_section() {
        let config = StravaConfig::parse(full_toml()).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.rate_limit.usage_header_name, "ratelimit-usage");
        assert_eq!(config.rate_limit.limit_header_name, "ratelimit-limit");
        assert_eq!(config.messages.unknown_error, "No response");
        assert_eq!(config.messages.rate_limit_exceeded, "Quota gone");
        assert_eq!(config.client.client_id, Some(5));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = StravaConfig::parse("[api]\nbase_url = \"ftp://strava.com\"").unwrap_err();
        assert!(err.to_string().contains("base_url"), "got: {err}");
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = StravaConfig::parse("[api]\ntimeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn rejects_invalid_header_name() {
        let err =
            StravaConfig::parse("[rate-limit]\nusage-header-name = \"X Rate Usage\"").unwrap_err();
        assert!(
            matches!(err, Error::InvalidHeaderName { key: "usage-header-name", .. }),
            "got: {err:?}"
        );

        let err = StravaConfig::parse("[rate-limit]\nlimit-header-name = \"\"").unwrap_err();
        assert!(
            matches!(err, Error::InvalidHeaderName { key: "limit-header-name", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn header_accessors_normalise_case() {
        let config = RateLimitConfig::default();
        assert_eq!(config.usage_header().unwrap().as_str(), "x-ratelimit-usage");
        assert_eq!(config.limit_header().unwrap().as_str(), "x-ratelimit-limit");
    }

    #[test]
    fn load_missing_file_fails() {
        let result = StravaConfig::load(Path::new("/nonexistent/strava.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn client_secret_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strava.toml");
        std::fs::write(&path, full_toml()).unwrap();

        unsafe { set_env("STRAVA_CLIENT_SECRET", "env-secret") };
        let config = StravaConfig::load(&path).unwrap();
        unsafe { remove_env("STRAVA_CLIENT_SECRET") };

        assert_eq!(
            config.client.client_secret.as_ref().unwrap().expose(),
            "env-secret"
        );
    }

    #[test]
    fn client_secret_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "file-secret\n").unwrap();

        let toml_content = format!(
            "[client]\nclient_id = 7\nclient_secret_file = \"{}\"\n",
            secret_path.display()
        );
        let path = dir.path().join("strava.toml");
        std::fs::write(&path, toml_content).unwrap();

        unsafe { remove_env("STRAVA_CLIENT_SECRET") };
        let config = StravaConfig::load(&path).unwrap();
        assert_eq!(
            config.client.client_secret.as_ref().unwrap().expose(),
            "file-secret"
        );
    }

    #[test]
    fn unreadable_secret_file_is_config_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strava.toml");
        std::fs::write(
            &path,
            "[client]\nclient_secret_file = \"/nonexistent/secret\"\n",
        )
        .unwrap();

        unsafe { remove_env("STRAVA_CLIENT_SECRET") };
        let err = StravaConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {err:?}");
    }

    #[test]
    fn resolve_path_prefers_cli() {
        let path = StravaConfig::resolve_path(Some("/etc/strava.toml"));
        assert_eq!(path, PathBuf::from("/etc/strava.toml"));
    }
}
