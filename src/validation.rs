//! Request field checks shared by the route handlers.
//!
//! Every function returns `ApiError::ValidationError` on bad input so the
//! handlers can simply `?` them.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::ApiError;

const MAX_NAME_LEN: usize = 100;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{9,15}$").expect("valid phone regex"));

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::ValidationError(msg.into())
}

/// Trims `value` and checks it is present and reasonably short.
pub fn validate_name(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{} is required", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(invalid(format!("{} must be at most {} characters", field, MAX_NAME_LEN)));
    }
    Ok(trimmed.to_string())
}

/// Returns the normalized (trimmed, lowercased) address.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let normalized = email.trim().to_lowercase();
    if !EMAIL_REGEX.is_match(&normalized) {
        return Err(invalid("Invalid email address"));
    }
    Ok(normalized)
}

/// Strips spaces and dashes, then expects 9 to 15 digits with an optional leading `+`.
pub fn validate_phone(phone: &str) -> Result<String, ApiError> {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if !PHONE_REGEX.is_match(&compact) {
        return Err(invalid("Invalid phone number"));
    }
    Ok(compact)
}

fn six_digits(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_pin(pin: &str) -> Result<(), ApiError> {
    if !six_digits(pin) {
        return Err(invalid("PIN must have exactly 6 digits"));
    }
    Ok(())
}

pub fn validate_code(code: &str) -> Result<(), ApiError> {
    if !six_digits(code.trim()) {
        return Err(invalid("Verification code must have exactly 6 digits"));
    }
    Ok(())
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(format!("{} must be a date in YYYY-MM-DD format", field)))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ApiError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| invalid(format!("{} must be a time in HH:MM format", field)))
}

pub fn validate_birth_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    if date > today {
        return Err(invalid("Birth date cannot be in the future"));
    }
    Ok(date)
}

/// Empty strings in optional fields are treated as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Patch semantics for nullable columns: absent leaves the column alone,
/// blank clears it, anything else sets it.
pub fn clearable_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| optional_text(Some(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("912345678")]
    #[case("+351912345678")]
    #[case("912 345 678")]
    #[case("912-345-678")]
    fn accepts_valid_phones(#[case] phone: &str) {
        assert!(validate_phone(phone).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("12345")]
    #[case("91234567a")]
    #[case("++351912345678")]
    fn rejects_invalid_phones(#[case] phone: &str) {
        assert!(validate_phone(phone).is_err());
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), Some(None))]
    #[case(Some("   "), Some(None))]
    #[case(Some(" Labrador "), Some(Some("Labrador")))]
    fn clearable_text_distinguishes_absent_from_blank(
        #[case] input: Option<&str>,
        #[case] expected: Option<Option<&str>>,
    ) {
        let got = clearable_text(input.map(str::to_string));
        assert_eq!(got, expected.map(|inner| inner.map(str::to_string)));
    }

    #[test]
    fn phone_is_compacted() {
        assert_eq!(validate_phone("912 345 678").unwrap(), "912345678");
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(validate_email("  Ana@Example.PT ").unwrap(), "ana@example.pt");
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[rstest]
    #[case("123456", true)]
    #[case("000000", true)]
    #[case("12345", false)]
    #[case("1234567", false)]
    #[case("12a456", false)]
    #[case("١٢٣٤٥٦", false)]
    fn pin_must_be_six_ascii_digits(#[case] pin: &str, #[case] ok: bool) {
        assert_eq!(validate_pin(pin).is_ok(), ok);
    }

    #[test]
    fn code_allows_surrounding_whitespace() {
        assert!(validate_code(" 654321 ").is_ok());
        assert!(validate_code("65432").is_err());
    }

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert_eq!(validate_name("name", "  Bobi ").unwrap(), "Bobi");
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(101)).is_err());
    }

    #[test]
    fn parses_dates_and_times() {
        assert_eq!(
            parse_date("date", "2030-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2030, 5, 1).unwrap()
        );
        assert!(parse_date("date", "01/05/2030").is_err());
        assert_eq!(
            parse_time("time", "14:30").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("time", "09:15:30").unwrap(),
            NaiveTime::from_hms_opt(9, 15, 30).unwrap()
        );
        assert!(parse_time("time", "25:00").is_err());
    }

    #[test]
    fn birth_date_cannot_be_in_the_future() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert!(validate_birth_date(today, today).is_ok());
        assert!(validate_birth_date(today.succ_opt().unwrap(), today).is_err());
    }

    #[test]
    fn blank_optional_text_is_none() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" Labrador ".into())), Some("Labrador".into()));
        assert_eq!(optional_text(None), None);
    }
}
