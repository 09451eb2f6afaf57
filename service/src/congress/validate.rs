//! Pure parameter validation rules.
//!
//! Every rule runs before any network I/O. A rejected value produces a
//! [`ValidationResult`] whose message names the legal bounds, so callers learn
//! the valid range instead of waiting on an upstream call that may never answer.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime, Utc};
use serde_json::Value;

use super::error::CongressError;

/// The first Congress convened in 1789.
pub const FIRST_CONGRESS: i64 = 1;

/// Upstream page-size ceiling.
pub const MAX_LIMIT: i64 = 250;

/// Every chamber the upstream API knows about. Endpoints accept a subset.
pub const CHAMBERS: &[&str] = &["house", "senate", "joint"];

/// Outcome of a single validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_message: Option<String>,
    /// Remediation hint naming the legal values, surfaced as a suggestion.
    pub hint: Option<String>,
}

impl ValidationResult {
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: Some(message.into()),
            hint: Some(hint.into()),
        }
    }

    /// Convert into a `Result`, building a Validation error for `parameter`.
    ///
    /// # Errors
    ///
    /// Returns [`CongressError::Validation`] when the rule rejected the value.
    pub fn into_result(self, parameter: &str, value: &Value) -> Result<(), CongressError> {
        if self.is_valid {
            return Ok(());
        }
        Err(CongressError::validation(
            parameter,
            value,
            self.error_message
                .unwrap_or_else(|| format!("Invalid value for {parameter}")),
            self.hint,
        ))
    }
}

/// Interpret a JSON value as an integer. Accepts integral numbers and numeric strings.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render a raw value the way it appears in messages.
#[must_use]
pub fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// Congress number in session for the given calendar year.
#[must_use]
pub const fn congress_for_year(year: i64) -> i64 {
    (year - 1789) / 2 + 1
}

#[must_use]
pub fn current_congress() -> i64 {
    congress_for_year(i64::from(Utc::now().year()))
}

#[must_use]
pub fn current_year() -> i64 {
    i64::from(Utc::now().year())
}

fn integer_in_range(
    value: &Value,
    range: &RangeInclusive<i64>,
    label: &str,
    hint: impl FnOnce() -> String,
) -> ValidationResult {
    match as_integer(value) {
        Some(n) if range.contains(&n) => ValidationResult::valid(),
        _ => ValidationResult::invalid(
            format!(
                "{label} must be an integer between {} and {} (got {}).",
                range.start(),
                range.end(),
                describe(value)
            ),
            hint(),
        ),
    }
}

pub fn validate_congress_number(value: &Value) -> ValidationResult {
    let current = current_congress();
    integer_in_range(value, &(FIRST_CONGRESS..=current), "Congress number", || {
        format!("Use a congress number between {FIRST_CONGRESS} and {current} (the current congress).")
    })
}

/// Case-insensitive chamber check against the endpoint's accepted subset.
pub fn validate_chamber(value: &Value, allowed: &[&str]) -> ValidationResult {
    let legal = allowed.join(", ");
    let matches = value
        .as_str()
        .map(|s| s.trim().to_ascii_lowercase())
        .is_some_and(|s| allowed.contains(&s.as_str()));
    if matches {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(
            format!("Chamber must be one of: {legal} (got {}).", describe(value)),
            format!("Use one of: {legal}."),
        )
    }
}

/// Year check against an endpoint-specific range. The message always carries the exact bounds.
pub fn validate_year(value: &Value, valid_range: RangeInclusive<i64>) -> ValidationResult {
    let (min, max) = (*valid_range.start(), *valid_range.end());
    match as_integer(value) {
        Some(year) if valid_range.contains(&year) => ValidationResult::valid(),
        Some(year) => ValidationResult::invalid(
            format!("Year must be between {min} and {max} for this endpoint (got {year})."),
            format!("Use a year between {min} and {max}."),
        ),
        None => ValidationResult::invalid(
            format!(
                "Year must be an integer between {min} and {max} (got {}).",
                describe(value)
            ),
            format!("Use a year between {min} and {max}."),
        ),
    }
}

pub fn validate_month(value: &Value) -> ValidationResult {
    integer_in_range(value, &(1..=12), "Month", || {
        "Use a month between 1 and 12.".to_string()
    })
}

#[must_use]
pub const fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

#[must_use]
pub const fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Day check. The calendar constraint only applies once year and month are
/// themselves usable; otherwise only the generic 1-31 bound is enforced.
pub fn validate_day(value: &Value, year: &Value, month: &Value) -> ValidationResult {
    let generic = integer_in_range(value, &(1..=31), "Day", || {
        "Use a day between 1 and 31.".to_string()
    });
    if !generic.is_valid {
        return generic;
    }

    let (Some(year), Some(month)) = (as_integer(year), as_integer(month)) else {
        return generic;
    };
    if !(1..=12).contains(&month) {
        return generic;
    }

    let day = as_integer(value).unwrap_or_default();
    let last = days_in_month(year, month);
    if day > last {
        return ValidationResult::invalid(
            format!("{year}-{month:02} has only {last} days (got day {day})."),
            format!("Use a day between 1 and {last} for {year}-{month:02}."),
        );
    }
    ValidationResult::valid()
}

/// Validate a full date, reporting the first failing component in year, month, day order.
pub fn validate_date(
    year: &Value,
    month: &Value,
    day: &Value,
    year_range: RangeInclusive<i64>,
) -> Result<(), CongressError> {
    validate_year(year, year_range).into_result("year", year)?;
    validate_month(month).into_result("month", month)?;
    validate_day(day, year, month).into_result("day", day)
}

pub fn validate_limit(value: &Value, max: i64) -> ValidationResult {
    integer_in_range(value, &(1..=max), "Limit", || {
        format!("Use a limit between 1 and {max}; page through larger result sets with offset.")
    })
}

pub fn validate_offset(value: &Value) -> ValidationResult {
    match as_integer(value) {
        Some(n) if n >= 0 => ValidationResult::valid(),
        _ => ValidationResult::invalid(
            format!(
                "Offset must be a non-negative integer (got {}).",
                describe(value)
            ),
            "Use an offset of 0 or greater.",
        ),
    }
}

/// Generic case-insensitive enumeration check (bill types, report types, ...).
pub fn validate_enum(value: &Value, legal_set: &[&str], field_name: &str) -> ValidationResult {
    let legal = legal_set.join(", ");
    let matches = match value {
        Value::String(s) => {
            let s = s.trim();
            legal_set.iter().any(|l| l.eq_ignore_ascii_case(s))
        }
        Value::Number(_) | Value::Bool(_) => {
            let s = value.to_string();
            legal_set.contains(&s.as_str())
        }
        _ => false,
    };
    if matches {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(
            format!(
                "{field_name} must be one of: {legal} (got {}).",
                describe(value)
            ),
            format!("Use one of: {legal}."),
        )
    }
}

pub fn validate_positive_integer(value: &Value, field_name: &str) -> ValidationResult {
    match as_integer(value) {
        Some(n) if n >= 1 => ValidationResult::valid(),
        _ => ValidationResult::invalid(
            format!(
                "{field_name} must be a positive integer (got {}).",
                describe(value)
            ),
            format!("Use a whole number of 1 or greater for {field_name}."),
        ),
    }
}

/// Identifiers are interpolated into the request path as a single segment,
/// so they are limited to `[A-Za-z0-9._-]` and may not be a dot segment.
pub fn validate_identifier(value: &Value, field_name: &str) -> ValidationResult {
    let text = match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    let ok = text.is_some_and(|s| {
        !s.is_empty()
            && s.len() <= 64
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !s.chars().all(|c| c == '.')
    });
    if ok {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(
            format!(
                "{field_name} must be an identifier of letters, digits, '.', '_' or '-' (got {}).",
                describe(value)
            ),
            format!("Pass the exact {field_name} as listed by the upstream API."),
        )
    }
}

/// Timestamp filters must be `YYYY-MM-DDTHH:MM:SSZ`.
pub fn validate_datetime(value: &Value, field_name: &str) -> ValidationResult {
    let ok = value
        .as_str()
        .is_some_and(|s| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%SZ").is_ok());
    if ok {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(
            format!(
                "{field_name} must be a UTC timestamp like 2022-01-01T00:00:00Z (got {}).",
                describe(value)
            ),
            format!("Format {field_name} as YYYY-MM-DDTHH:MM:SSZ."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn congress_boundaries() {
        let current = current_congress();
        let cases = [
            (json!(0), false, "zero"),
            (json!(1), true, "first congress"),
            (json!(117), true, "recent congress"),
            (json!("117"), true, "numeric string"),
            (json!(current), true, "current congress"),
            (json!(current + 1), false, "future congress"),
            (json!(117.5), false, "fractional"),
            (json!("abc"), false, "non-numeric string"),
            (json!(null), false, "null"),
        ];

        for (value, should_pass, desc) in cases {
            let result = validate_congress_number(&value);
            assert_eq!(result.is_valid, should_pass, "case '{desc}': {result:?}");
        }
    }

    #[test]
    fn congress_message_names_range() {
        let result = validate_congress_number(&json!(500));
        let message = result.error_message.unwrap_or_default();
        assert!(message.contains(&format!("between 1 and {}", current_congress())));
    }

    #[test]
    fn congress_for_year_matches_known_sessions() {
        assert_eq!(congress_for_year(2021), 117);
        assert_eq!(congress_for_year(2022), 117);
        assert_eq!(congress_for_year(2025), 119);
        assert_eq!(congress_for_year(1789), 1);
    }

    #[test]
    fn chamber_is_case_insensitive_and_respects_subset() {
        assert!(validate_chamber(&json!("House"), CHAMBERS).is_valid);
        assert!(validate_chamber(&json!("SENATE"), &["house", "senate"]).is_valid);

        let result = validate_chamber(&json!("joint"), &["house", "senate"]);
        assert!(!result.is_valid);
        assert!(result
            .error_message
            .unwrap_or_default()
            .contains("house, senate"));
    }

    #[test]
    fn year_out_of_range_reports_exact_bounds() {
        let result = validate_year(&json!(1800), 1873..=1997);
        assert!(!result.is_valid);
        assert!(result
            .error_message
            .unwrap_or_default()
            .contains("between 1873 and 1997"));

        assert!(validate_year(&json!(1873), 1873..=1997).is_valid);
        assert!(validate_year(&json!(1997), 1873..=1997).is_valid);
        assert!(!validate_year(&json!(1998), 1873..=1997).is_valid);
    }

    #[test]
    fn month_boundaries() {
        for (month, should_pass) in [(0, false), (1, true), (12, true), (13, false)] {
            assert_eq!(validate_month(&json!(month)).is_valid, should_pass, "month {month}");
        }
        assert_eq!(
            validate_month(&json!(13)).hint.as_deref(),
            Some("Use a month between 1 and 12.")
        );
    }

    #[test]
    fn day_respects_calendar() {
        let cases = [
            (2021, 2, 28, true, "last day of february"),
            (2021, 2, 29, false, "non-leap february"),
            (2021, 2, 30, false, "february 30"),
            (2020, 2, 29, true, "leap day"),
            (1900, 2, 29, false, "century non-leap"),
            (2000, 2, 29, true, "quad-century leap"),
            (2021, 4, 31, false, "april 31"),
            (2021, 12, 31, true, "december 31"),
            (2021, 1, 0, false, "day zero"),
        ];

        for (year, month, day, should_pass, desc) in cases {
            let result = validate_day(&json!(day), &json!(year), &json!(month));
            assert_eq!(result.is_valid, should_pass, "case '{desc}': {result:?}");
        }
    }

    #[test]
    fn day_skips_calendar_check_when_month_invalid() {
        assert!(validate_day(&json!(31), &json!(2021), &json!(13)).is_valid);
        assert!(validate_day(&json!(31), &json!("x"), &json!(2)).is_valid);
    }

    #[test]
    fn validate_date_reports_first_failure() {
        let err = validate_date(&json!(1800), &json!(13), &json!(40), 1873..=1997)
            .expect_err("year should fail");
        assert!(matches!(err, CongressError::Validation { ref parameter, .. } if parameter == "year"));

        let err = validate_date(&json!(1900), &json!(13), &json!(1), 1873..=1997)
            .expect_err("month should fail");
        assert!(matches!(err, CongressError::Validation { ref parameter, .. } if parameter == "month"));

        assert!(validate_date(&json!(1900), &json!(1), &json!(15), 1873..=1997).is_ok());
    }

    #[test]
    fn limit_and_offset_boundaries() {
        let limits = [(0, false), (1, true), (250, true), (251, false), (-5, false)];
        for (limit, should_pass) in limits {
            assert_eq!(
                validate_limit(&json!(limit), MAX_LIMIT).is_valid,
                should_pass,
                "limit {limit}"
            );
        }
        assert!(validate_offset(&json!(0)).is_valid);
        assert!(validate_offset(&json!("40")).is_valid);
        assert!(!validate_offset(&json!(-1)).is_valid);
        assert!(!validate_offset(&json!("ten")).is_valid);
    }

    #[test]
    fn enum_accepts_case_variants() {
        let bill_types = ["hr", "s", "hjres"];
        assert!(validate_enum(&json!("HR"), &bill_types, "billType").is_valid);
        let result = validate_enum(&json!("xyz"), &bill_types, "billType");
        assert!(!result.is_valid);
        assert!(result
            .error_message
            .unwrap_or_default()
            .starts_with("billType must be one of: hr, s, hjres"));
        assert!(validate_enum(&json!(1), &["1", "2"], "session").is_valid);
    }

    #[test]
    fn identifier_rejects_path_injection() {
        assert!(validate_identifier(&json!("A000360"), "bioguideId").is_valid);
        assert!(!validate_identifier(&json!("../bill"), "bioguideId").is_valid);
        assert!(!validate_identifier(&json!("  "), "bioguideId").is_valid);
        assert!(validate_identifier(&json!("PN78-1"), "nominationId").is_valid);
        assert!(validate_identifier(&json!("v1.2_a"), "bioguideId").is_valid);
        for rejected in [".", "..", "...", "a?b=1", "a b", "%2e%2e", "a#b", "a\\b"] {
            assert!(
                !validate_identifier(&json!(rejected), "bioguideId").is_valid,
                "{rejected} should be rejected"
            );
        }
    }

    #[test]
    fn datetime_format() {
        assert!(validate_datetime(&json!("2022-01-01T00:00:00Z"), "fromDateTime").is_valid);
        assert!(!validate_datetime(&json!("2022-01-01"), "fromDateTime").is_valid);
    }

    proptest! {
        #[test]
        fn day_validation_agrees_with_calendar(year in 1600i64..2400, month in 1i64..=12, day in 1i64..=31) {
            let expected = i32::try_from(year)
                .ok()
                .and_then(|y| NaiveDate::from_ymd_opt(y, month as u32, day as u32))
                .is_some();
            let result = validate_day(&json!(day), &json!(year), &json!(month));
            prop_assert_eq!(result.is_valid, expected);
        }

        #[test]
        fn limit_outside_bounds_is_rejected(limit in prop_oneof![-1000i64..=0, 251i64..10_000]) {
            prop_assert!(!validate_limit(&json!(limit), MAX_LIMIT).is_valid);
        }
    }
}
