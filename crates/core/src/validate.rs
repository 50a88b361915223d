use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use thiserror::Error;

/// Field-level validation failure. The messages are user-facing: the
/// conversation engine echoes them verbatim when re-prompting.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("Address must be at least 5 characters")]
    AddressTooShort,
    #[error("That does not look like a valid email address")]
    InvalidEmail,
    #[error("Invalid phone format. Use international format (e.g., +1234567890)")]
    InvalidPhone,
    #[error("Invalid date format. Please use YYYY-MM-DD, DD/MM/YYYY, or MM/DD/YYYY")]
    InvalidDateFormat,
    #[error("Date of birth must be in the past")]
    BirthDateNotInPast,
    #[error("You must be at least 13 years old")]
    BelowMinimumAge,
    #[error("Date of birth must be after 1900")]
    BirthYearTooEarly,
}

/// A validated, normalized field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

pub fn full_name(raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < 2 {
        return Err(FieldError::NameTooShort);
    }
    Ok(trimmed.to_string())
}

pub fn address(raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < 5 {
        return Err(FieldError::AddressTooShort);
    }
    Ok(trimmed.to_string())
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
        )
        .expect("email pattern compiles")
    })
}

/// Syntax check plus normalization: the stored form is always trimmed and
/// lower-cased, so lookups by email are case-insensitive by construction.
pub fn email(raw: &str) -> Result<String, FieldError> {
    let normalized = raw.trim().to_lowercase();
    if email_pattern().is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(FieldError::InvalidEmail)
    }
}

/// Normalizes an internationally-formatted phone number to its E.164 string.
/// Accepts a leading `+` or `00` prefix and common separators; the digit
/// count must land in the E.164 range (8..=15) and cannot start with zero.
pub fn phone_number(raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    let rest = if let Some(rest) = trimmed.strip_prefix('+') {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("00") {
        rest
    } else {
        return Err(FieldError::InvalidPhone);
    };

    let mut digits = String::with_capacity(rest.len());
    for character in rest.chars() {
        match character {
            '0'..='9' => digits.push(character),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(FieldError::InvalidPhone),
        }
    }

    if !(8..=15).contains(&digits.len()) || digits.starts_with('0') {
        return Err(FieldError::InvalidPhone);
    }

    Ok(format!("+{digits}"))
}

// Tried in order; the first format that parses wins, so ambiguous strings
// like "03/04/2020" resolve as day-first.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y"];

/// Parses and validates a date of birth. `today` is injected so the age and
/// in-the-past rules stay deterministic under test.
pub fn date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    let trimmed = raw.trim();
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or(FieldError::InvalidDateFormat)?;

    if parsed >= today {
        return Err(FieldError::BirthDateNotInPast);
    }
    if age_on(parsed, today) < 13 {
        return Err(FieldError::BelowMinimumAge);
    }
    if parsed.year() < 1900 {
        return Err(FieldError::BirthYearTooEarly);
    }

    Ok(parsed)
}

fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        address, date_of_birth, email, full_name, phone_number, FieldError, FieldValue,
    };

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn full_name_trims_and_enforces_minimum_length() {
        assert_eq!(full_name("  Alice Johnson  "), Ok("Alice Johnson".to_string()));
        assert_eq!(full_name(" A "), Err(FieldError::NameTooShort));
    }

    #[test]
    fn address_requires_five_characters_after_trim() {
        assert_eq!(address("456 Oak Ave"), Ok("456 Oak Ave".to_string()));
        assert_eq!(address("  ab  "), Err(FieldError::AddressTooShort));
    }

    #[test]
    fn email_lowercases_and_trims() {
        assert_eq!(email("  Alice@Example.COM "), Ok("alice@example.com".to_string()));
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for raw in ["not-an-email", "a@b", "@example.com", "alice@", "a b@example.com"] {
            assert_eq!(email(raw), Err(FieldError::InvalidEmail), "should reject {raw}");
        }
    }

    #[test]
    fn email_normalization_is_idempotent() {
        let once = email("Alice.Johnson@Example.com").expect("valid email");
        assert_eq!(email(&once), Ok(once.clone()));
    }

    #[test]
    fn phone_normalizes_separators_to_e164() {
        assert_eq!(phone_number("+1 415 555 1234"), Ok("+14155551234".to_string()));
        assert_eq!(phone_number("+1 (415) 555-1234"), Ok("+14155551234".to_string()));
        assert_eq!(phone_number("0014155551234"), Ok("+14155551234".to_string()));
    }

    #[test]
    fn phone_normalization_is_idempotent() {
        let once = phone_number("+1 415 555 1234").expect("valid phone");
        assert_eq!(phone_number(&once), Ok(once.clone()));
    }

    #[test]
    fn phone_rejects_missing_prefix_and_bad_lengths() {
        assert_eq!(phone_number("4155551234"), Err(FieldError::InvalidPhone));
        assert_eq!(phone_number("+1234"), Err(FieldError::InvalidPhone));
        assert_eq!(phone_number("+1234567890123456"), Err(FieldError::InvalidPhone));
        assert_eq!(phone_number("+0123456789"), Err(FieldError::InvalidPhone));
        assert_eq!(phone_number("+1-800-FLOWERS"), Err(FieldError::InvalidPhone));
    }

    #[test]
    fn date_accepts_every_documented_format() {
        let today = day(2026, 8, 6);
        let expected = day(1995, 3, 20);
        for raw in ["1995-03-20", "20/03/1995", "03/20/1995", "20-03-1995", "03-20-1995"] {
            assert_eq!(date_of_birth(raw, today), Ok(expected), "format {raw}");
        }
    }

    #[test]
    fn ambiguous_date_resolves_day_first() {
        // "03/04/2020" parses as 3 April, not 4 March: DD/MM/YYYY is tried
        // before MM/DD/YYYY.
        let parsed = date_of_birth("03/04/2000", day(2026, 8, 6)).expect("parses");
        assert_eq!(parsed, day(2000, 4, 3));
    }

    #[test]
    fn date_of_birth_must_be_in_the_past() {
        let today = day(2026, 8, 6);
        assert_eq!(date_of_birth("2026-08-06", today), Err(FieldError::BirthDateNotInPast));
        assert_eq!(date_of_birth("2030-01-01", today), Err(FieldError::BirthDateNotInPast));
    }

    #[test]
    fn minimum_age_counts_the_birthday_itself() {
        let today = day(2026, 8, 6);
        // Turns 13 exactly today: old enough.
        assert_eq!(date_of_birth("2013-08-06", today), Ok(day(2013, 8, 6)));
        // One day short of 13.
        assert_eq!(date_of_birth("2013-08-07", today), Err(FieldError::BelowMinimumAge));
    }

    #[test]
    fn birth_year_must_be_at_least_1900() {
        let today = day(2026, 8, 6);
        assert_eq!(date_of_birth("1899-12-31", today), Err(FieldError::BirthYearTooEarly));
        assert_eq!(date_of_birth("1900-01-01", today), Ok(day(1900, 1, 1)));
    }

    #[test]
    fn unparseable_dates_report_the_format_error() {
        let today = day(2026, 8, 6);
        assert_eq!(date_of_birth("March 20, 1995", today), Err(FieldError::InvalidDateFormat));
        assert_eq!(date_of_birth("1995/03/20", today), Err(FieldError::InvalidDateFormat));
    }

    #[test]
    fn field_value_display_uses_iso_dates() {
        assert_eq!(FieldValue::Date(day(1995, 3, 20)).to_string(), "1995-03-20");
        assert_eq!(FieldValue::Text("abc".to_string()).to_string(), "abc");
    }
}
