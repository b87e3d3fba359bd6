use chrono::{DateTime, Utc};
use thiserror::Error;

pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 5000;
pub const MAX_QUESTION_TEXT_LEN: usize = 1000;
pub const MAX_QUESTION_DETAILS_LEN: usize = 5000;
pub const MAX_ANSWER_TEXT_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be between 1 and {max} characters")]
    Length { field: &'static str, max: usize },
    #[error("start date must be strictly before end date")]
    DateRange,
    #[error("page must be at least 1")]
    Page,
    #[error("order must not be negative")]
    Order,
    #[error("weight must be a finite, non-negative number")]
    Weight,
}

fn require_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(ValidationError::Length { field, max });
    }
    Ok(())
}

pub fn validate_poll_title(title: &str) -> Result<(), ValidationError> {
    require_len("title", title, MAX_TITLE_LEN)
}

pub fn validate_poll_description(description: &str) -> Result<(), ValidationError> {
    require_len("description", description, MAX_DESCRIPTION_LEN)
}

pub fn validate_poll_dates(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::DateRange);
    }
    Ok(())
}

pub fn validate_question_text(text: &str) -> Result<(), ValidationError> {
    require_len("question text", text, MAX_QUESTION_TEXT_LEN)
}

/// Details are optional, but when present must fit the limit.
pub fn validate_question_details(details: Option<&str>) -> Result<(), ValidationError> {
    if let Some(details) = details {
        if details.chars().count() > MAX_QUESTION_DETAILS_LEN {
            return Err(ValidationError::Length {
                field: "question details",
                max: MAX_QUESTION_DETAILS_LEN,
            });
        }
    }
    Ok(())
}

pub fn validate_answer_text(text: &str) -> Result<(), ValidationError> {
    require_len("answer text", text, MAX_ANSWER_TEXT_LEN)
}

pub fn validate_page(page: i64) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::Page);
    }
    Ok(())
}

pub fn validate_order(order: i64) -> Result<(), ValidationError> {
    if order < 0 {
        return Err(ValidationError::Order);
    }
    Ok(())
}

pub fn validate_weight(weight: f64) -> Result<(), ValidationError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ValidationError::Weight);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn title_rejects_empty_and_whitespace() {
        assert!(validate_poll_title("").is_err());
        assert!(validate_poll_title("   ").is_err());
        assert!(validate_poll_title("T").is_ok());
    }

    #[test]
    fn title_rejects_over_limit() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(validate_poll_title(&long).is_err());
        let max = "x".repeat(MAX_TITLE_LEN);
        assert!(validate_poll_title(&max).is_ok());
    }

    #[test]
    fn dates_must_be_strictly_ordered() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap();
        assert!(validate_poll_dates(start, end).is_ok());
        assert!(validate_poll_dates(end, start).is_err());
        assert!(validate_poll_dates(start, start).is_err());
    }

    #[test]
    fn details_are_optional() {
        assert!(validate_question_details(None).is_ok());
        assert!(validate_question_details(Some("fine")).is_ok());
        let long = "x".repeat(MAX_QUESTION_DETAILS_LEN + 1);
        assert!(validate_question_details(Some(&long)).is_err());
    }

    #[test]
    fn weight_rejects_negative_and_non_finite() {
        assert!(validate_weight(0.0).is_ok());
        assert!(validate_weight(2.5).is_ok());
        assert!(validate_weight(-0.1).is_err());
        assert!(validate_weight(f64::NAN).is_err());
        assert!(validate_weight(f64::INFINITY).is_err());
    }

    #[test]
    fn page_and_order_bounds() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_order(0).is_ok());
        assert!(validate_order(-1).is_err());
    }
}
