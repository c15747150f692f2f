//! Common types for the Strava client workspace

mod config;
mod error;
mod secret;

pub use config::{ApiConfig, ClientConfig, MessagesConfig, RateLimitConfig, StravaConfig};
pub use error::{Error, Result};
pub use secret::Secret;
