//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Maximum length of an event title.
pub const MAX_TITLE_LENGTH: u64 = 200;

/// Validates that a text field contains something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a schedule window does not end before it starts.
pub fn validate_schedule(
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<(), ValidationError> {
    if end < start {
        let mut err = ValidationError::new("schedule_window");
        err.message = Some("end_date must not be before start_date".into());
        Err(err)
    } else {
        Ok(())
    }
}
