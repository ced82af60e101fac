// # Routes Module
//
// - HTTP route handlers for the marketplace API, one submodule per resource.
// - Every module exposes a `create_*_routes()` function returning a
//   `Router<AppState>`; `server.rs` merges them.
//
// ## Route Modules
// - `health`: liveness endpoints
// - `auth`: registration, login, profile, logout
// - `uploads`: photo upload (multipart and by link)
// - `places`: property listings
// - `bookings`: property bookings
// - `guides`: tour-guide profiles
// - `guide_bookings`: bookings of tour guides

use axum::extract::FromRequest;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::errors::ApiError;

/// Health check and monitoring endpoints
pub mod health;

/// Account endpoints
pub mod auth;

pub mod bookings;
pub mod guide_bookings;
pub mod guides;
pub mod places;
pub mod uploads;

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Trimmed value of a required text field
pub fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing(field))
}

/// Trimmed value of an optional text field, empty when absent
pub fn optional(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Split a comma-separated list, dropping blank entries
pub fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whole number sent either as a JSON number or a numeric string (form inputs
/// post strings). `None` when absent, null or blank.
pub fn integer(field: &str, value: Option<&Value>) -> Result<Option<i64>, ApiError> {
    let invalid = || ApiError::validation(field, format!("{field} must be a whole number"));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Some(f as i64))
                .ok_or_else(invalid),
        },
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Text sent as a JSON string or number, trimmed; empty when absent
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Calendar date as `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| ApiError::validation(field, format!("{field} must be a date (YYYY-MM-DD)")))
}

/// Instant as RFC 3339, or a bare date taken as midnight UTC
pub fn timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::validation(field, format!("{field} must be an RFC 3339 timestamp")))
}
