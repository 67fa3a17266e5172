//! Input validation for user-supplied query parameters.
//!
//! Everything here normalizes as it validates: callers get back the value
//! they should actually send to the API (trimmed, case-folded), or an
//! [`ElectionwatchError::InvalidInput`] describing what was wrong.

use chrono::NaiveDate;

use crate::chamber::Chamber;
use crate::error::ElectionwatchError;

pub const MAX_SEARCH_LENGTH: usize = 100;
pub const MAX_ID_LENGTH: usize = 64;

/// Largest row count the backend will return per request.
pub const MAX_LIMIT: i64 = 400;

/// Contest scopes the API recognizes, matching the dashboard's queries.
pub const VALID_SCOPES: &[&str] = &[
    "state",
    "us_senate",
    "us_house",
    "state_senate",
    "state_house",
    "county",
    "county_commissioner",
    "municipal",
    "school",
    "judicial",
    "soil_water",
    "hospital",
];

/// Strip ASCII control characters, trim whitespace, and enforce a
/// byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, ElectionwatchError> {
    if input.len() > max_len {
        return Err(ElectionwatchError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(ElectionwatchError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a free-text search term (contest title or street address).
pub fn validate_search(input: &str) -> Result<String, ElectionwatchError> {
    sanitize_text(input, MAX_SEARCH_LENGTH)
}

/// Validate a contest scope: case-insensitive, checked against the known
/// scope list.
pub fn validate_scope(input: &str) -> Result<String, ElectionwatchError> {
    let lower = input.trim().to_lowercase();
    if VALID_SCOPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        Err(ElectionwatchError::InvalidInput(format!(
            "unknown scope '{}'. Valid scopes: {}",
            input,
            VALID_SCOPES.join(", ")
        )))
    }
}

/// Validate an election id of the form `id-YYYYMMDD`.
pub fn validate_election_id(input: &str) -> Result<String, ElectionwatchError> {
    let id = sanitize_text(input, MAX_ID_LENGTH)?;
    let date = id.strip_prefix("id-").ok_or_else(|| {
        ElectionwatchError::InvalidInput(format!(
            "election id '{}' must look like id-20221108",
            input
        ))
    })?;
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ElectionwatchError::InvalidInput(format!(
            "election id '{}' must end in an eight-digit date",
            input
        )));
    }
    if NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
        return Err(ElectionwatchError::InvalidInput(format!(
            "election id '{}' does not name a real date",
            input
        )));
    }
    Ok(id)
}

/// Validate a contest id (e.g. `id-MN---43000-2101`).
pub fn validate_contest_id(input: &str) -> Result<String, ElectionwatchError> {
    let id = sanitize_text(input, MAX_ID_LENGTH)?;
    if !id.starts_with("id-") {
        return Err(ElectionwatchError::InvalidInput(format!(
            "contest id '{}' must start with id-",
            input
        )));
    }
    if !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(ElectionwatchError::InvalidInput(format!(
            "contest id '{}' may only contain letters, digits, and dashes",
            input
        )));
    }
    Ok(id)
}

/// Validate a party code, returning it uppercased (`dfl` -> `DFL`).
pub fn validate_party_id(input: &str) -> Result<String, ElectionwatchError> {
    let party = input.trim().to_uppercase();
    if party.is_empty() || party.len() > 12 {
        return Err(ElectionwatchError::InvalidInput(
            "party code must be between 1 and 12 characters".to_string(),
        ));
    }
    if !party.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ElectionwatchError::InvalidInput(format!(
            "party code '{}' may only contain letters and digits",
            input
        )));
    }
    Ok(party)
}

/// Validate a chamber name: case-insensitive, supports shorthand s/h.
pub fn validate_chamber(input: &str) -> Result<Chamber, ElectionwatchError> {
    match input.trim().to_lowercase().as_str() {
        "senate" | "s" => Ok(Chamber::Senate),
        "house" | "h" => Ok(Chamber::House),
        _ => Err(ElectionwatchError::InvalidInput(format!(
            "unknown chamber '{}'. Valid chambers: senate, house (or s, h)",
            input
        ))),
    }
}

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(
    latitude: f64,
    longitude: f64,
) -> Result<(f64, f64), ElectionwatchError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ElectionwatchError::InvalidInput(format!(
            "latitude {} is out of range (-90 to 90)",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ElectionwatchError::InvalidInput(format!(
            "longitude {} is out of range (-180 to 180)",
            longitude
        )));
    }
    Ok((latitude, longitude))
}

/// Validate a page size against the backend's hard cap.
pub fn validate_limit(limit: i64) -> Result<i64, ElectionwatchError> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(ElectionwatchError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )))
    }
}

/// Validate a row offset.
pub fn validate_offset(offset: i64) -> Result<i64, ElectionwatchError> {
    if offset >= 0 {
        Ok(offset)
    } else {
        Err(ElectionwatchError::InvalidInput(
            "offset cannot be negative".to_string(),
        ))
    }
}
