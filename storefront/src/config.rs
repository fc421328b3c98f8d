//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::environment::{FixedGeolocation, Geolocation, NoGeolocation};
use pizza_api::{client::DEFAULT_API_URL, geocoding::DEFAULT_GEOCODING_URL, Position};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote services
    pub api: ApiConfig,
    /// Device position
    pub location: LocationConfig,
    /// Demo binary behaviour
    pub demo: DemoConfig,
}

/// Remote service endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Restaurant API base URL (`PIZZA_API_URL`)
    pub base_url: String,
    /// Reverse geocoding endpoint (`GEOCODING_API_URL`)
    pub geocoding_url: String,
}

/// Device position configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed device position (`PIZZA_POSITION`, `"lat,lng"`); none means
    /// the address has to be typed in
    pub position: Option<Position>,
}

/// Demo binary configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Actually place an order (`PIZZA_DEMO_SUBMIT=1`)
    pub submit: bool,
    /// Phone number used for the demo order (`PIZZA_DEMO_PHONE`)
    pub phone: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Falls back to the public endpoints when a variable is missing.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let position = lookup("PIZZA_POSITION").and_then(|raw| {
            let position = parse_position(&raw);
            if position.is_none() {
                tracing::warn!(value = %raw, "Ignoring PIZZA_POSITION, expected \"lat,lng\"");
            }
            position
        });

        Self {
            api: ApiConfig {
                base_url: lookup("PIZZA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                geocoding_url: lookup("GEOCODING_API_URL")
                    .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            },
            location: LocationConfig { position },
            demo: DemoConfig {
                submit: lookup("PIZZA_DEMO_SUBMIT")
                    .is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes")),
                phone: lookup("PIZZA_DEMO_PHONE").unwrap_or_else(|| "+15551234567".to_string()),
            },
        }
    }

    /// Geolocation matching the configured position
    #[must_use]
    pub fn geolocation(&self) -> Arc<dyn Geolocation> {
        match self.location.position {
            Some(position) => Arc::new(FixedGeolocation::new(position)),
            None => Arc::new(NoGeolocation),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Parses `"lat,lng"`
#[must_use]
pub fn parse_position(raw: &str) -> Option<Position> {
    let (latitude, longitude) = raw.split_once(',')?;
    let latitude: f64 = latitude.trim().parse().ok()?;
    let longitude: f64 = longitude.trim().parse().ok()?;

    ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude))
        .then(|| Position::new(latitude, longitude))
}
