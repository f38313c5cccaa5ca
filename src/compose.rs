//! Response composition.
//!
//! Takes the opaque upstream payload and augments it: resolution metadata
//! on every response, and — for a historical request with a specific time —
//! the flattened single-hour slice of the hourly series.
//!
//! Augmentation is modelled as an explicit envelope rather than ad hoc key
//! merging. Flattening at the boundary only ever adds keys; an upstream key
//! is never removed or overwritten.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{CityInfo, Coordinates, WeatherQuery};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Locally-added fields, kept separate from the upstream document until
/// serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Augmentation {
    pub city_info: CityInfo,
    /// The flattened hourly slice, when the requested hour was located.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_time_data: Option<Map<String, Value>>,
    /// The instant the extraction targeted. Set whenever extraction ran,
    /// found or not — diagnostic, not a found-flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_time_data_for: Option<String>,
    /// Present instead of `specific_time_data` when the hour was not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// An upstream payload paired with its augmentation.
#[derive(Debug, Clone)]
pub struct ComposedWeather {
    pub upstream: Value,
    pub augmentation: Augmentation,
}

impl ComposedWeather {
    /// Flatten the augmentation keys into the upstream object.
    ///
    /// Keys already present upstream win; a non-object upstream payload
    /// (never observed from Open-Meteo) is preserved under `data`.
    pub fn into_json(self) -> Value {
        let mut root = match self.upstream {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        if let Ok(Value::Object(aug)) = serde_json::to_value(&self.augmentation) {
            for (key, value) in aug {
                root.entry(key).or_insert(value);
            }
        }

        Value::Object(root)
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Compose the final weather payload for a query.
///
/// Pure: no I/O. The history write happens in the route handler after this
/// returns.
pub fn compose(upstream: Value, query: &WeatherQuery, coords: &Coordinates) -> ComposedWeather {
    let mut augmentation = Augmentation {
        city_info: CityInfo {
            requested_city: query.city.clone(),
            found_city: coords.resolved_name.clone(),
            country: coords.country.clone(),
        },
        specific_time_data: None,
        requested_time_data_for: None,
        warning: None,
    };

    // Hour extraction only applies to a historical request with a time,
    // and only when the payload actually carries an hourly series.
    if let Some(target) = query.target_instant() {
        if let Some(hourly) = upstream.get("hourly").and_then(Value::as_object) {
            if let Some(times) = hourly.get("time").and_then(Value::as_array) {
                match find_hour_index(times, &target) {
                    Some(i) => {
                        augmentation.specific_time_data = Some(extract_hour(hourly, i));
                    }
                    None => {
                        augmentation.warning = Some(format!(
                            "No data for specified hour {} on {}. Returning daily historical data.",
                            query.time.as_deref().unwrap_or(""),
                            query.date.as_deref().unwrap_or(""),
                        ));
                    }
                }
                augmentation.requested_time_data_for = Some(target);
            }
        }
    }

    ComposedWeather {
        upstream,
        augmentation,
    }
}

/// Index of the first hourly timestamp starting with the target instant.
/// Series cover at most one day (≤24 entries), so a linear scan is fine.
fn find_hour_index(times: &[Value], target: &str) -> Option<usize> {
    times
        .iter()
        .position(|t| t.as_str().is_some_and(|s| s.starts_with(target)))
}

/// Flatten position `index` of every parallel array in the hourly series
/// into a single-hour record. Keys whose arrays are too short are skipped;
/// non-array keys are ignored.
fn extract_hour(hourly: &Map<String, Value>, index: usize) -> Map<String, Value> {
    let mut slice = Map::new();
    for (key, value) in hourly {
        if let Some(arr) = value.as_array() {
            if let Some(element) = arr.get(index) {
                slice.insert(key.clone(), element.clone());
            }
        }
    }
    slice
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coords() -> Coordinates {
        Coordinates {
            latitude: 48.85,
            longitude: 2.35,
            resolved_name: "Paris".to_string(),
            country: Some("France".to_string()),
        }
    }

    fn archive_payload() -> Value {
        json!({
            "latitude": 48.85,
            "longitude": 2.35,
            "timezone": "Europe/Paris",
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T02:00"],
                "temperature_2m": [3.1, 2.8, 2.5],
                "relative_humidity_2m": [88, 90, 91],
                "weather_code": [3, 3, 61],
                "wind_speed_10m": [10.2, 9.8, 11.0]
            }
        })
    }

    fn historical_query(time: &str) -> WeatherQuery {
        WeatherQuery {
            city: "paris".to_string(),
            date: Some("2024-01-01".to_string()),
            time: Some(time.to_string()),
        }
    }

    #[test]
    fn test_hour_found_flattens_every_series() {
        let composed = compose(archive_payload(), &historical_query("2"), &coords());

        let slice = composed.augmentation.specific_time_data.as_ref().unwrap();
        assert_eq!(slice["time"], json!("2024-01-01T02:00"));
        assert_eq!(slice["temperature_2m"], json!(2.5));
        assert_eq!(slice["relative_humidity_2m"], json!(91));
        assert_eq!(slice["weather_code"], json!(61));
        assert_eq!(slice["wind_speed_10m"], json!(11.0));
        assert_eq!(slice.len(), 5);

        assert_eq!(
            composed.augmentation.requested_time_data_for.as_deref(),
            Some("2024-01-01T02:00")
        );
        assert!(composed.augmentation.warning.is_none());
    }

    #[test]
    fn test_hour_missing_sets_warning() {
        let composed = compose(archive_payload(), &historical_query("15:00"), &coords());

        assert!(composed.augmentation.specific_time_data.is_none());
        let warning = composed.augmentation.warning.as_deref().unwrap();
        assert!(warning.contains("15:00"));
        assert!(warning.contains("2024-01-01"));
        // Still attached as a diagnostic.
        assert_eq!(
            composed.augmentation.requested_time_data_for.as_deref(),
            Some("2024-01-01T15:00")
        );
    }

    #[test]
    fn test_ragged_series_skips_short_arrays() {
        let payload = json!({
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "temperature_2m": [3.1, 2.8],
                "precipitation": [0.0]
            }
        });
        let composed = compose(payload, &historical_query("1"), &coords());
        let slice = composed.augmentation.specific_time_data.unwrap();
        assert_eq!(slice["temperature_2m"], json!(2.8));
        assert!(!slice.contains_key("precipitation"));
    }

    #[test]
    fn test_no_time_means_no_extraction() {
        let query = WeatherQuery {
            city: "paris".to_string(),
            date: Some("2024-01-01".to_string()),
            time: None,
        };
        let composed = compose(archive_payload(), &query, &coords());
        assert!(composed.augmentation.specific_time_data.is_none());
        assert!(composed.augmentation.requested_time_data_for.is_none());
        assert!(composed.augmentation.warning.is_none());
    }

    #[test]
    fn test_forecast_payload_without_date_skips_extraction() {
        // time without date is meaningless — the forecast branch ignores it.
        let query = WeatherQuery {
            city: "paris".to_string(),
            date: None,
            time: Some("14".to_string()),
        };
        let composed = compose(json!({"current": {"temperature_2m": 8.3}}), &query, &coords());
        assert!(composed.augmentation.specific_time_data.is_none());
        assert!(composed.augmentation.requested_time_data_for.is_none());
    }

    #[test]
    fn test_payload_without_hourly_series() {
        let composed = compose(json!({"daily": {}}), &historical_query("3"), &coords());
        assert!(composed.augmentation.specific_time_data.is_none());
        assert!(composed.augmentation.requested_time_data_for.is_none());
        assert!(composed.augmentation.warning.is_none());
    }

    #[test]
    fn test_city_info_always_attached() {
        let query = WeatherQuery {
            city: "paris".to_string(),
            ..Default::default()
        };
        let composed = compose(json!({}), &query, &coords());
        assert_eq!(composed.augmentation.city_info.requested_city, "paris");
        assert_eq!(composed.augmentation.city_info.found_city, "Paris");
        assert_eq!(
            composed.augmentation.city_info.country.as_deref(),
            Some("France")
        );
    }

    #[test]
    fn test_into_json_flattens_augmentation() {
        let composed = compose(archive_payload(), &historical_query("0"), &coords());
        let json = composed.into_json();

        // Upstream fields untouched.
        assert_eq!(json["timezone"], json!("Europe/Paris"));
        assert_eq!(json["hourly"]["temperature_2m"][0], json!(3.1));
        // Augmentation keys flattened to the top level.
        assert_eq!(json["city_info"]["found_city"], json!("Paris"));
        assert_eq!(json["specific_time_data"]["temperature_2m"], json!(3.1));
        assert_eq!(json["requested_time_data_for"], json!("2024-01-01T00:00"));
        // Absent optionals stay absent, not null.
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn test_into_json_never_overwrites_upstream() {
        let payload = json!({
            "city_info": "upstream-owned",
            "current": {"temperature_2m": 8.3}
        });
        let query = WeatherQuery {
            city: "paris".to_string(),
            ..Default::default()
        };
        let json = compose(payload, &query, &coords()).into_json();
        assert_eq!(json["city_info"], json!("upstream-owned"));
        assert_eq!(json["current"]["temperature_2m"], json!(8.3));
    }
}
