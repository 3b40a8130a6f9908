use chrono::NaiveDate;
use sdg_utils::dates::{format_date, start_of_year};
use std::fmt;

/// An inclusive calendar range, as chosen with the dashboard's date pickers.
///
/// Both ends are included. A range whose start is after its end is empty.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// January 1st of `today`'s year through `today`.
    pub fn year_to_date(today: NaiveDate) -> Self {
        DateRange(start_of_year(&today), today)
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    pub fn end(&self) -> NaiveDate {
        self.1
    }

    pub fn is_empty(&self) -> bool {
        self.0 > self.1
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0 <= *date && *date <= self.1
    }

    /// Number of days covered (0 when empty).
    pub fn num_days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.1 - self.0).num_days() + 1
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", format_date(&self.0), format_date(&self.1))
    }
}

#[cfg(test)]
mod tests {
    use super::DateRange;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_num_days() {
        let range = DateRange(ymd(2024, 1, 1), ymd(2024, 1, 5));
        assert_eq!(range.num_days(), 5);
        // 2024 is a leap year
        assert_eq!(DateRange(ymd(2024, 2, 1), ymd(2024, 3, 1)).num_days(), 30);
    }

    #[test]
    fn test_date_range_single_day_is_inclusive() {
        let day = ymd(2024, 1, 1);
        let range = DateRange(day, day);
        assert!(range.contains(&day));
        assert!(!range.contains(&ymd(2024, 1, 2)));
        assert!(!range.contains(&ymd(2023, 12, 31)));
        assert_eq!(range.num_days(), 1);
    }

    #[test]
    fn test_date_range_empty() {
        let range = DateRange(ymd(2022, 3, 15), ymd(2022, 3, 14));
        assert!(range.is_empty());
        assert_eq!(range.num_days(), 0);
        assert!(!range.contains(&ymd(2022, 3, 14)));
    }

    #[test]
    fn test_year_to_date() {
        let range = DateRange::year_to_date(ymd(2026, 10, 19));
        assert_eq!(range.start(), ymd(2026, 1, 1));
        assert_eq!(range.end(), ymd(2026, 10, 19));
        assert_eq!(range.to_string(), "2026-01-01 → 2026-10-19");
    }
}
