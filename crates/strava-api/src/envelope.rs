//! Strava's diagnostic error payload
//!
//! Every failed call returns a body of the form
//! `{"message": "Bad Request", "errors": [{"resource": "Application", "field": "client_id", "code": "invalid"}]}`.
//! Fields are frequently missing, so every field has a default.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One entry of the `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceError {
    /// Kind of thing that failed, e.g. "Application" or "Athlete"
    #[serde(default)]
    pub resource: String,
    /// Attribute of the resource at fault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Short symbolic reason, e.g. "invalid" or "missing"
    #[serde(default)]
    pub code: String,
}

impl ResourceError {
    pub fn new(resource: impl Into<String>, field: Option<&str>, code: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            field: field.map(str::to_owned),
            code: code.into(),
        }
    }
}

/// The service's own description of why a call failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ResourceError>,
}

impl ResponseEnvelope {
    /// Envelope carrying only free text, used when the body can't be parsed.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: ResourceError) -> Self {
        self.errors.push(error);
        self
    }

    /// Strava signals a revoked or expired access token with a 401 carrying
    /// `{"resource": "Application", "code": "invalid"}`.
    pub fn is_token_invalid(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.resource == "Application" && e.code == "invalid")
    }

    pub fn message_is(&self, expected: &str) -> bool {
        self.message.as_deref() == Some(expected)
    }
}

impl fmt::Display for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or("<no message>"))?;
        for error in &self.errors {
            write!(f, " [{}", error.resource)?;
            if let Some(field) = &error.field {
                write!(f, ".{field}")?;
            }
            write!(f, ": {}]", error.code)?;
        }
        Ok(())
    }
}
