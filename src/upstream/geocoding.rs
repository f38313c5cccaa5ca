//! City-name geocoding via the Open-Meteo Geocoding API.
//!
//! API: `https://geocoding-api.open-meteo.com/v1/search`
//! Auth: None required.
//!
//! Every failure mode — transport error, non-success status, zero results —
//! normalizes to `None` so the HTTP surface can answer deterministically
//! with a single not-found outcome.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::Coordinates;
use crate::upstream::build_http_client;

const BASE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodingError {
    #[serde(default)]
    reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeocodingClient {
    http: Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            base_url: base_url.into(),
        })
    }

    fn search_url(&self, city: &str) -> String {
        format!(
            "{}?name={}&count=1&language=en&format=json",
            self.base_url,
            urlencoding::encode(city)
        )
    }

    /// Resolve a free-text city name to its single best-match coordinates.
    ///
    /// Returns `None` when the city is unknown or the lookup fails for any
    /// reason; failures are logged here and never surface to the caller.
    pub async fn resolve(&self, city: &str) -> Option<Coordinates> {
        let url = self.search_url(city);

        let resp = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(city, error = %e, "Geocoding request failed");
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let reason = resp
                .json::<GeocodingError>()
                .await
                .ok()
                .and_then(|e| e.reason);
            warn!(
                city,
                status = status.as_u16(),
                reason = reason.as_deref().unwrap_or("unknown"),
                "Geocoding API returned non-success"
            );
            return None;
        }

        let data: GeocodingResponse = match resp.json().await {
            Ok(d) => d,
            Err(e) => {
                warn!(city, error = %e, "Failed to parse geocoding response");
                return None;
            }
        };

        let first = data.results.into_iter().next()?;
        debug!(
            city,
            resolved = %first.name,
            lat = first.latitude,
            lon = first.longitude,
            "City resolved"
        );

        Some(Coordinates {
            latitude: first.latitude,
            longitude: first.longitude,
            resolved_name: first.name,
            country: first.country,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
