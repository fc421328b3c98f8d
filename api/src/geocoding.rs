//! Reverse geocoding client

use crate::{error::ApiError, types::Position};
use reqwest::Client;
use serde::Deserialize;

/// Public reverse-geocoding endpoint
pub const DEFAULT_GEOCODING_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";

/// Turns a position into a postal address
#[derive(Clone, Debug)]
pub struct GeocodingClient {
    client: Client,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReverseGeocodeResponse {
    locality: String,
    city: String,
    postcode: String,
    country_name: String,
}

impl ReverseGeocodeResponse {
    fn address(&self) -> String {
        format!(
            "{}, {} {}, {}",
            self.locality, self.city, self.postcode, self.country_name
        )
    }
}

impl GeocodingClient {
    /// Create a client for the public endpoint
    #[must_use]
    pub fn new() -> Self {
        Self::with_url(DEFAULT_GEOCODING_URL)
    }

    /// Create a client for the endpoint at `url`
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Formats the address at `position` as `"locality, city postcode, country"`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AddressUnavailable`] for non-success statuses, or
    /// transport and parsing errors.
    #[tracing::instrument(skip(self), fields(position = %position))]
    pub async fn reverse_geocode(&self, position: Position) -> Result<String, ApiError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", position.latitude),
                ("longitude", position.longitude),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status, "Reverse geocoding rejected");
            return Err(ApiError::AddressUnavailable { status });
        }

        let body = response.bytes().await?;
        let place: ReverseGeocodeResponse = serde_json::from_slice(&body)
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))?;
        Ok(place.address())
    }
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}
