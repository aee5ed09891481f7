//! Input validation rules
//!
//! Shape checks that run before any entity is loaded. Everything here
//! reports [`EventHubError::Validation`].

use crate::utils::errors::{EventHubError, Result};

pub const EVENT_TITLE_MIN: usize = 3;
pub const EVENT_TITLE_MAX: usize = 120;
pub const EVENT_ANNOTATION_MIN: usize = 20;
pub const EVENT_ANNOTATION_MAX: usize = 2000;
pub const EVENT_DESCRIPTION_MIN: usize = 20;
pub const EVENT_DESCRIPTION_MAX: usize = 7000;

pub const PAGE_DEFAULT_FROM: i64 = 0;
pub const PAGE_DEFAULT_SIZE: i64 = 10;

/// Validate a text field against length bounds, rejecting blank values
pub fn validate_text(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EventHubError::validation(format!(
            "Field: {}. Error: must not be blank. Value: {}",
            field, value
        )));
    }

    let length = value.chars().count();
    if length < min || length > max {
        return Err(EventHubError::validation(format!(
            "Field: {}. Error: length must be between {} and {} characters. Value length: {}",
            field, min, max, length
        )));
    }

    Ok(())
}

/// Validate an optional text field; absent values pass
pub fn validate_optional_text(field: &str, value: Option<&str>, min: usize, max: usize) -> Result<()> {
    match value {
        Some(v) => validate_text(field, v, min, max),
        None => Ok(()),
    }
}

pub fn validate_title(title: Option<&str>) -> Result<()> {
    validate_optional_text("title", title, EVENT_TITLE_MIN, EVENT_TITLE_MAX)
}

pub fn validate_annotation(annotation: Option<&str>) -> Result<()> {
    validate_optional_text("annotation", annotation, EVENT_ANNOTATION_MIN, EVENT_ANNOTATION_MAX)
}

pub fn validate_description(description: Option<&str>) -> Result<()> {
    validate_optional_text("description", description, EVENT_DESCRIPTION_MIN, EVENT_DESCRIPTION_MAX)
}

/// Participant limits are non-negative; zero means unlimited
pub fn validate_participant_limit(limit: Option<i32>) -> Result<()> {
    match limit {
        Some(value) if value < 0 => Err(EventHubError::validation(format!(
            "Field: participantLimit. Error: must be non-negative. Value: {}",
            value
        ))),
        _ => Ok(()),
    }
}

/// Validate a latitude/longitude pair
pub fn validate_location(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(EventHubError::validation(format!(
            "Field: location. Error: coordinates out of range. Value: ({}, {})",
            lat, lon
        )));
    }
    Ok(())
}

/// Resolve `from`/`size` pagination parameters, applying defaults
pub fn validate_page(from: Option<i64>, size: Option<i64>) -> Result<(i64, i64)> {
    let from = from.unwrap_or(PAGE_DEFAULT_FROM);
    let size = size.unwrap_or(PAGE_DEFAULT_SIZE);

    if from < 0 {
        return Err(EventHubError::validation("Parameter 'from' must be non-negative"));
    }
    if size < 1 {
        return Err(EventHubError::validation("Parameter 'size' must be positive"));
    }

    Ok((from, size))
}
