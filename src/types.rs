//! Core domain types shared across the crate.
//!
//! Query/validation types for the lookup path, the search-history record,
//! and the error taxonomy every route maps onto a status code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lookup types
// ---------------------------------------------------------------------------

/// A geocoded location. Produced per-request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Canonical place name returned by the geocoder (may differ from the
    /// free-text query, e.g. "münchen" → "Munich").
    pub resolved_name: String,
    pub country: Option<String>,
}

/// Resolution metadata attached to every weather response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityInfo {
    pub requested_city: String,
    pub found_city: String,
    pub country: Option<String>,
}

/// A weather lookup request as taken off the query string.
///
/// `time` is only meaningful when `date` is present — the forecast branch
/// ignores it.
#[derive(Debug, Clone, Default)]
pub struct WeatherQuery {
    pub city: String,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl WeatherQuery {
    /// Check the query against the input contract. Runs before any
    /// outbound call; violations are client errors, not faults.
    pub fn validate(&self) -> Result<(), LookupError> {
        if self.city.trim().is_empty() {
            return Err(LookupError::InvalidInput(
                "City parameter is required".to_string(),
            ));
        }
        if let Some(date) = &self.date {
            if !is_valid_date(date) {
                return Err(LookupError::InvalidInput(
                    "Invalid date format. Use YYYY-MM-DD.".to_string(),
                ));
            }
        }
        if let Some(time) = &self.time {
            if parse_hour(time).is_none() {
                return Err(LookupError::InvalidInput(
                    "Invalid time format. Use HH or HH:MM (24-hour format).".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The instant string used to locate an hourly entry:
    /// `date + "T" + zero-padded hour + ":00"`.
    ///
    /// `None` unless both date and a valid time are present.
    pub fn target_instant(&self) -> Option<String> {
        let date = self.date.as_deref()?;
        let hour = parse_hour(self.time.as_deref()?)?;
        Some(format!("{date}T{hour:02}:00"))
    }
}

/// Strict `YYYY-MM-DD`: exact shape plus a real calendar date.
pub fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    digits_ok && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Parse `HH` or `HH:MM` into the hour, enforcing hour 0–23 and, when a
/// minute component is present, minute 0–59. Minutes are discarded —
/// hourly series have no finer resolution.
pub fn parse_hour(time: &str) -> Option<u32> {
    let mut parts = time.splitn(2, ':');
    let hour: u32 = parts.next()?.parse().ok()?;
    if hour > 23 {
        return None;
    }
    if let Some(minute_part) = parts.next() {
        let minute: u32 = minute_part.parse().ok()?;
        if minute > 59 {
            return None;
        }
    }
    Some(hour)
}

// ---------------------------------------------------------------------------
// Search history
// ---------------------------------------------------------------------------

/// One past search. Append-only; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub city: String,
    pub date: Option<String>,
    pub time: Option<String>,
    /// RFC 3339 UTC, assigned by the store at write time.
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure taxonomy for the lookup path. The HTTP layer owns the single
/// mapping from these variants to status codes.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Missing or malformed client input. Never logged as a fault.
    #[error("{0}")]
    InvalidInput(String),

    /// The geocoder produced no match for the requested city.
    #[error("Could not find coordinates for city: {0}")]
    CityNotFound(String),

    /// The weather provider answered with a non-success status.
    #[error("Upstream error ({status}): {detail}")]
    Upstream { status: u16, detail: String },

    /// The history store is unavailable or a query failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transport failures and anything else unexpected.
    #[error("Internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn query(city: &str, date: Option<&str>, time: Option<&str>) -> WeatherQuery {
        WeatherQuery {
            city: city.to_string(),
            date: date.map(str::to_string),
            time: time.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_requires_city() {
        assert!(query("Berlin", None, None).validate().is_ok());
        assert!(matches!(
            query("", None, None).validate(),
            Err(LookupError::InvalidInput(_))
        ));
        assert!(matches!(
            query("   ", None, None).validate(),
            Err(LookupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_date_shape() {
        assert!(query("Paris", Some("2024-01-01"), None).validate().is_ok());
        for bad in ["01-01-2024", "2024/01/01", "2024-1-1", "20240101", "yesterday"] {
            assert!(
                query("Paris", Some(bad), None).validate().is_err(),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_validate_date_calendar() {
        // Shape alone is not enough — month 13 is not a date.
        assert!(query("Paris", Some("2024-13-01"), None).validate().is_err());
        assert!(query("Paris", Some("2024-02-30"), None).validate().is_err());
        // 2024 is a leap year.
        assert!(query("Paris", Some("2024-02-29"), None).validate().is_ok());
    }

    #[test]
    fn test_validate_time() {
        assert!(query("Paris", Some("2024-01-01"), Some("14")).validate().is_ok());
        assert!(query("Paris", Some("2024-01-01"), Some("14:30")).validate().is_ok());
        assert!(query("Paris", Some("2024-01-01"), Some("0")).validate().is_ok());
        assert!(query("Paris", Some("2024-01-01"), Some("23:59")).validate().is_ok());

        for bad in ["24", "30:00", "12:60", "-1", "abc", "12:xx", ""] {
            assert!(
                query("Paris", Some("2024-01-01"), Some(bad)).validate().is_err(),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_parse_hour() {
        assert_eq!(parse_hour("0"), Some(0));
        assert_eq!(parse_hour("09"), Some(9));
        assert_eq!(parse_hour("23:59"), Some(23));
        assert_eq!(parse_hour("14:00"), Some(14));
        assert_eq!(parse_hour("24"), None);
        assert_eq!(parse_hour("12:60"), None);
        assert_eq!(parse_hour(""), None);
    }

    #[test]
    fn test_target_instant_padding() {
        let q = query("Oslo", Some("2023-06-15"), Some("7"));
        assert_eq!(q.target_instant().as_deref(), Some("2023-06-15T07:00"));

        let q = query("Oslo", Some("2023-06-15"), Some("14:30"));
        assert_eq!(q.target_instant().as_deref(), Some("2023-06-15T14:00"));
    }

    #[test]
    fn test_target_instant_requires_both() {
        assert_eq!(query("Oslo", Some("2023-06-15"), None).target_instant(), None);
        assert_eq!(query("Oslo", None, Some("14")).target_instant(), None);
    }

    #[test]
    fn test_lookup_error_display() {
        let e = LookupError::Upstream {
            status: 429,
            detail: "rate limited".to_string(),
        };
        assert_eq!(format!("{e}"), "Upstream error (429): rate limited");

        let e = LookupError::CityNotFound("Nowhere12345".to_string());
        assert!(format!("{e}").contains("Nowhere12345"));
    }

    #[test]
    fn test_history_entry_serializes() {
        let entry = SearchHistoryEntry {
            id: 1,
            city: "Berlin".to_string(),
            date: None,
            time: None,
            created_at: "2026-02-21T12:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("Berlin"));
        assert!(json.contains("\"date\":null"));
    }
}
