//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating client configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A `[rate-limit]` header name that HTTP would reject
    #[error("Configuration error: {key} is not a valid HTTP header name: {name:?}")]
    InvalidHeaderName { key: &'static str, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let config_err = Error::Config("usage-header-name must not be empty".into());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: usage-header-name must not be empty"
        );

        let io_err = Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "strava.toml",
        ));
        assert!(
            io_err.to_string().starts_with("I/O error:"),
            "got: {}",
            io_err
        );
    }

    #[test]
    fn invalid_header_name_names_the_setting() {
        let err = Error::InvalidHeaderName {
            key: "usage-header-name",
            name: "X Rate".into(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration error: usage-header-name is not a valid HTTP header name: \"X Rate\""
        );
    }

    #[test]
    fn toml_errors_convert() {
        let parse_err = toml::from_str::<toml::Value>("[api").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Toml(_)), "got: {err:?}");
    }
}
