//! Shared utility functions for SDG dashboard crates.

pub mod text;

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, NaiveDate, NaiveTime};

    /// Calendar-only formats accepted in measurement files.
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    /// Time-of-day suffixes accepted after the calendar part.
    const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format a NaiveDate as "DD/MM/YYYY", the way dashboard tables show it.
    pub fn format_date_display(date: &NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a measurement date cell.
    ///
    /// Accepts `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time
    /// separated by `T` or a space. The time is validated and dropped.
    pub fn parse_observation_date(s: &str) -> Result<NaiveDate, DateError> {
        let trimmed = s.trim();
        let (date_part, time_part) = match trimmed.find(|c: char| c == 'T' || c == ' ') {
            Some(idx) => (&trimmed[..idx], Some(trimmed[idx + 1..].trim())),
            None => (trimmed, None),
        };
        let date = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
            .ok_or_else(|| DateError(format!("unrecognised date `{}`", trimmed)))?;
        if let Some(time) = time_part {
            let valid_time = TIME_FORMATS
                .iter()
                .any(|fmt| NaiveTime::parse_from_str(time, fmt).is_ok());
            if !valid_time {
                return Err(DateError(format!("unrecognised time in `{}`", trimmed)));
            }
        }
        Ok(date)
    }

    /// January 1st of the year containing `date`.
    pub fn start_of_year(date: &NaiveDate) -> NaiveDate {
        date.with_ordinal(1).unwrap_or(*date)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
            assert_eq!(format_date_display(&date), "15/06/2023");
        }

        #[test]
        fn test_parse_observation_date_variants() {
            let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
            assert_eq!(parse_observation_date("2024-01-02").unwrap(), expected);
            assert_eq!(parse_observation_date(" 2024/01/02 ").unwrap(), expected);
            assert_eq!(parse_observation_date("2024-01-02 00:00:00").unwrap(), expected);
            assert_eq!(parse_observation_date("2024-01-02T06:30").unwrap(), expected);
        }

        #[test]
        fn test_parse_observation_date_rejects_garbage() {
            assert!(parse_observation_date("").is_err());
            assert!(parse_observation_date("02-01-2024").is_err());
            assert!(parse_observation_date("2024-02-30").is_err());
            assert!(parse_observation_date("2024-01-02 noon").is_err());
        }

        #[test]
        fn test_start_of_year() {
            let date = NaiveDate::from_ymd_opt(2024, 8, 19).unwrap();
            assert_eq!(
                start_of_year(&date),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            );
        }
    }
}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
