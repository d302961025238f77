//! Parsing for human-entered time requirements
//!
//! Rank requirements store durations as free text like "30 days", "6 weeks",
//! or "2 months". Everything is normalized to whole days; months count as 30.

use crate::error::{PartyError, Result};

/// Parse a time requirement string into a number of days.
///
/// Accepted units are `day`, `week`, and `month` (singular or plural,
/// any capitalization). A bare number is treated as days.
pub fn parse_time_requirement(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PartyError::validation_field(
            "Time requirement is empty",
            "required_value",
        ));
    }

    let mut parts = trimmed.split_whitespace();
    let amount_str = parts.next().unwrap_or_default();
    let amount: i64 = amount_str.parse().map_err(|_| {
        PartyError::validation_field(
            format!("Invalid time amount: '{}'", amount_str),
            "required_value",
        )
    })?;

    if amount < 0 {
        return Err(PartyError::validation_field(
            "Time requirement cannot be negative",
            "required_value",
        ));
    }

    let unit = parts.next().unwrap_or("days").to_lowercase();
    if parts.next().is_some() {
        return Err(PartyError::validation_field(
            format!("Unrecognized time requirement: '{}'", trimmed),
            "required_value",
        ));
    }

    let days = match unit.trim_end_matches('s') {
        "day" => amount,
        "week" => amount * 7,
        "month" => amount * 30,
        other => {
            return Err(PartyError::validation_field(
                format!("Unknown time unit: '{}'", other),
                "required_value",
            ))
        }
    };

    Ok(days)
}

/// Format a day count back into the largest clean unit for display
pub fn format_days(days: i64) -> String {
    if days >= 30 && days % 30 == 0 {
        let months = days / 30;
        format!("{} month{}", months, if months == 1 { "" } else { "s" })
    } else if days >= 7 && days % 7 == 0 {
        let weeks = days / 7;
        format!("{} week{}", weeks, if weeks == 1 { "" } else { "s" })
    } else {
        format!("{} day{}", days, if days == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_time_requirement("30 days").unwrap(), 30);
        assert_eq!(parse_time_requirement("1 day").unwrap(), 1);
        assert_eq!(parse_time_requirement("45").unwrap(), 45);
    }

    #[test]
    fn test_parse_weeks() {
        assert_eq!(parse_time_requirement("6 weeks").unwrap(), 42);
        assert_eq!(parse_time_requirement("1 Week").unwrap(), 7);
    }

    #[test]
    fn test_parse_months() {
        assert_eq!(parse_time_requirement("2 months").unwrap(), 60);
        assert_eq!(parse_time_requirement("1 MONTH").unwrap(), 30);
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(parse_time_requirement("  3 weeks  ").unwrap(), 21);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_time_requirement("").is_err());
        assert!(parse_time_requirement("soon").is_err());
        assert!(parse_time_requirement("3 fortnights").is_err());
        assert!(parse_time_requirement("-2 weeks").is_err());
        assert!(parse_time_requirement("3 weeks extra").is_err());
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(1), "1 day");
        assert_eq!(format_days(10), "10 days");
        assert_eq!(format_days(14), "2 weeks");
        assert_eq!(format_days(30), "1 month");
        assert_eq!(format_days(90), "3 months");
    }
}
