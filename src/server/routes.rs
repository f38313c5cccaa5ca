//! API route handlers.
//!
//! All endpoints return JSON. Shared clients and the history store travel
//! in `Arc<AppState>`. The `IntoResponse` impl on `LookupError` is the one
//! place a lookup outcome maps to a status code.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::compose::compose;
use crate::storage::HistoryStore;
use crate::types::{LookupError, SearchHistoryEntry, WeatherQuery};
use crate::upstream::geocoding::GeocodingClient;
use crate::upstream::meteo::MeteoClient;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything a request handler needs, injected once at startup.
pub struct AppState {
    pub geocoder: GeocodingClient,
    pub meteo: MeteoClient,
    pub history: HistoryStore,
}

pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            // Client mistakes, not faults — no log.
            LookupError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg.clone(),
                    details: None,
                },
            ),
            LookupError::CityNotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                },
            ),
            LookupError::Upstream { status, detail } => {
                error!(status = *status, detail = %detail, "Weather provider call failed");
                let code = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    code,
                    ErrorBody {
                        error: "Failed to fetch weather data from Open-Meteo.".to_string(),
                        details: Some(detail.clone()),
                    },
                )
            }
            LookupError::Storage(msg) => {
                error!(error = %msg, "History store unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Failed to fetch search history".to_string(),
                        details: None,
                    },
                )
            }
            LookupError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal server error".to_string(),
                        details: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/weather?city=&date=&time=
pub async fn get_weather(
    State(state): State<SharedState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<Value>, LookupError> {
    // An empty date/time param means "not provided", same as its absence.
    let query = WeatherQuery {
        city: params.city.unwrap_or_default(),
        date: params.date.filter(|s| !s.is_empty()),
        time: params.time.filter(|s| !s.is_empty()),
    };

    // Input contract first — nothing goes out on the wire for a bad query.
    query.validate()?;

    let coords = state
        .geocoder
        .resolve(&query.city)
        .await
        .ok_or_else(|| LookupError::CityNotFound(query.city.clone()))?;

    let payload = state.meteo.fetch(&coords, query.date.as_deref()).await?;
    let composed = compose(payload, &query, &coords);

    // Fire-and-forget: the history write never delays or fails the
    // response. Failures are logged and dropped.
    let store = state.history.clone();
    let (city, date, time) = (
        coords.resolved_name.clone(),
        query.date.clone(),
        query.time.clone(),
    );
    tokio::spawn(async move {
        match store.record(&city, date.as_deref(), time.as_deref()).await {
            Ok(id) => debug!(id, city = %city, "Search history recorded"),
            Err(e) => warn!(error = %e, city = %city, "Failed to record search history"),
        }
    });

    Ok(Json(composed.into_json()))
}

/// GET /api/history
pub async fn get_history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SearchHistoryEntry>>, LookupError> {
    let entries = state.history.recent().await?;
    Ok(Json(entries))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
