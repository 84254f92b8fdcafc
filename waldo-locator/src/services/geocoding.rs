//! Nominatim (OpenStreetMap) geocoding client
//!
//! Returns the provider's payload as a strictly-typed [`RawPlace`];
//! normalization into a `GeographicPlacement` happens in the resolver.

use super::GeocodingProvider;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("waldo/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Invalid rate limit: {0} requests/second")]
    InvalidRate(u32),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Geocoder returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One Nominatim search hit
///
/// Numeric values arrive as strings; they are parsed during normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPlace {
    pub lat: String,
    pub lon: String,
    /// `[south, north, west, east]`
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub address: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub extratags: Option<BTreeMap<String, String>>,
}

pub struct NominatimClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl NominatimClient {
    /// Client with its own request budget; share one instance process-wide
    pub fn new(base_url: &str, requests_per_second: u32) -> Result<Self, GeocodeError> {
        let rate = NonZeroU32::new(requests_per_second)
            .ok_or(GeocodeError::InvalidRate(requests_per_second))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeocodeError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: governor::RateLimiter::direct(governor::Quota::per_second(rate)),
        })
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn lookup(&self, name: &str) -> Result<Option<RawPlace>, GeocodeError> {
        self.rate_limiter.until_ready().await;

        debug!(query = %name, "Nominatim lookup");

        let response = self
            .http_client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", name),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let places: Vec<RawPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        Ok(places.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_place_parses_full_payload() {
        let payload = r#"[{
            "place_id": 1234,
            "lat": "38.8950368",
            "lon": "-77.0365427",
            "display_name": "Washington, District of Columbia, United States",
            "boundingbox": ["38.7916303", "38.9959680", "-77.1197949", "-76.9093660"],
            "type": "administrative",
            "address": {"city": "Washington", "country": "United States", "country_code": "us"},
            "extratags": {"admin_level": "4", "wikidata": "Q61"}
        }]"#;

        let places: Vec<RawPlace> = serde_json::from_str(payload).unwrap();
        let place = &places[0];

        assert_eq!(place.lat, "38.8950368");
        assert_eq!(place.boundingbox.as_ref().map(Vec::len), Some(4));
        assert_eq!(place.place_type.as_deref(), Some("administrative"));
        assert_eq!(
            place.extratags.as_ref().and_then(|t| t.get("admin_level")).map(String::as_str),
            Some("4")
        );
    }

    #[test]
    fn test_raw_place_optional_fields_absent() {
        let place: RawPlace = serde_json::from_str(r#"{"lat": "1.0", "lon": "2.0"}"#).unwrap();
        assert!(place.boundingbox.is_none());
        assert!(place.address.is_none());
        assert!(place.extratags.is_none());
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(
            NominatimClient::new("https://nominatim.example", 0),
            Err(GeocodeError::InvalidRate(0))
        ));
    }
}
