//! Synchronous parameter validation for job submission.
//!
//! This is the only stage that surfaces errors to the submitter; everything
//! after the initial insert runs detached. Failures carry one message per
//! violated field so form layers can render them next to their inputs.

use thiserror::Error;

/// Latitude bounds of the supported grid, inclusive.
pub const MIN_LAT: f64 = 14.5;
pub const MAX_LAT: f64 = 52.0;

/// Longitude bounds of the supported grid, inclusive.
pub const MIN_LON: f64 = -131.0;
pub const MAX_LON: f64 = -53.0;

/// A single violated constraint, tied to the submission field it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Submission parameters outside their declared ranges.
#[derive(Debug, Clone, Error)]
#[error("invalid job parameters: {}", field_list(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Whether any of the recorded errors concerns the given field.
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn field_list(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field)
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_coordinate_errors(errors: &mut Vec<FieldError>, lat: f64, lon: f64) {
    // Negated >= so NaN coordinates fail the lower bound too.
    if !(lat >= MIN_LAT) {
        errors.push(FieldError::new(
            "lat",
            format!("Latitude must be greater than or equal to {MIN_LAT}"),
        ));
    }
    if lat > MAX_LAT {
        errors.push(FieldError::new(
            "lat",
            format!("Latitude must be less than or equal to {MAX_LAT}"),
        ));
    }
    if !(lon >= MIN_LON) {
        errors.push(FieldError::new(
            "lon",
            format!("Longitude must be greater than or equal to {MIN_LON}"),
        ));
    }
    if lon > MAX_LON {
        errors.push(FieldError::new(
            "lon",
            format!("Longitude must be less than or equal to {MAX_LON}"),
        ));
    }
}

// Deliberately does not require start_year <= end_year; that invariant is
// left to the caller.
fn push_period_errors(errors: &mut Vec<FieldError>, start_year: i32, end_year: i32) {
    if start_year <= 0 {
        errors.push(FieldError::new("start_year", "Please enter a year."));
    }
    if end_year <= 0 {
        errors.push(FieldError::new("end_year", "Please enter a year."));
    }
}

/// Validates the coordinate-fetch submission path.
pub(crate) fn validate_submission(
    lat: f64,
    lon: f64,
    start_year: i32,
    end_year: i32,
) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    push_coordinate_errors(&mut errors, lat, lon);
    push_period_errors(&mut errors, start_year, end_year);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

/// Validates the manual-upload path: the period always, the coordinates
/// only when the form supplied them.
pub(crate) fn validate_upload(
    location: Option<(f64, f64)>,
    start_year: i32,
    end_year: i32,
) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    if let Some((lat, lon)) = location {
        push_coordinate_errors(&mut errors, lat, lon);
    }
    push_period_errors(&mut errors, start_year, end_year);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}
