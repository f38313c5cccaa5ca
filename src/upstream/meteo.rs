//! Weather data fetch from Open-Meteo.
//!
//! Two modes, selected by whether a date was supplied:
//! - forecast: `https://api.open-meteo.com/v1/forecast` — current
//!   conditions, a short-range hourly series and a daily summary.
//! - archive: `https://archive-api.open-meteo.com/v1/archive` — the hourly
//!   series for exactly one past day (start date = end date).
//!
//! The payload is passed through opaque; the composer adds to it without
//! interpreting provider fields.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::types::{Coordinates, LookupError};
use crate::upstream::build_http_client;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// How much of a non-JSON error body to keep as diagnostic detail.
const ERROR_SNIPPET_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct MeteoClient {
    http: Client,
    forecast_url: String,
    archive_url: String,
}

impl MeteoClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_urls(FORECAST_URL, ARCHIVE_URL)
    }

    /// Point the client at different endpoints (tests).
    pub fn with_base_urls(
        forecast_url: impl Into<String>,
        archive_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            forecast_url: forecast_url.into(),
            archive_url: archive_url.into(),
        })
    }

    fn forecast_request_url(&self, coords: &Coordinates) -> String {
        format!(
            "{}?latitude={}&longitude={}\
             &current=temperature_2m,relative_humidity_2m,apparent_temperature,is_day,precipitation,weather_code,wind_speed_10m\
             &hourly=temperature_2m,weather_code,precipitation_probability\
             &daily=weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset\
             &timezone=auto",
            self.forecast_url, coords.latitude, coords.longitude
        )
    }

    fn archive_request_url(&self, coords: &Coordinates, date: &str) -> String {
        format!(
            "{}?latitude={}&longitude={}&start_date={date}&end_date={date}\
             &hourly=temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,weather_code,wind_speed_10m\
             &timezone=auto",
            self.archive_url, coords.latitude, coords.longitude
        )
    }

    /// Fetch the raw weather payload for a location.
    ///
    /// `date`, when present, must already be validated as `YYYY-MM-DD` —
    /// a malformed date is a client-input error and never reaches here.
    pub async fn fetch(
        &self,
        coords: &Coordinates,
        date: Option<&str>,
    ) -> Result<Value, LookupError> {
        let url = match date {
            Some(d) => self.archive_request_url(coords, d),
            None => self.forecast_request_url(coords),
        };
        debug!(historical = date.is_some(), "Fetching weather data");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Internal(format!("Open-Meteo request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response body".to_string());
            return Err(LookupError::Upstream {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| LookupError::Internal(format!("Failed to parse Open-Meteo response: {e}")))
    }
}

/// Best-effort diagnostic from an error body: the JSON `reason` field when
/// the body parses, otherwise a truncated raw snippet. A parse failure here
/// never masks the original status.
fn error_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(reason) = json.get("reason").and_then(Value::as_str) {
            return reason.to_string();
        }
    }
    body.chars().take(ERROR_SNIPPET_LEN).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
