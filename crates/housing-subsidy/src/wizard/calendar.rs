use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Calendar month with a 0-based month index (January = 0).
///
/// Serialized as `YYYY-MM` with a 1-based month, so it can key JSON objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month0: u32,
}

impl MonthKey {
    pub fn new(year: i32, month0: u32) -> Option<Self> {
        (month0 < 12).then_some(Self { year, month0 })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month0: date.month0(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month0 == 0 {
            Self {
                year: self.year - 1,
                month0: 11,
            }
        } else {
            Self {
                year: self.year,
                month0: self.month0 - 1,
            }
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a YYYY-MM month")]
pub struct MonthKeyParseError(String);

impl FromStr for MonthKey {
    type Err = MonthKeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let err = || MonthKeyParseError(value.to_string());
        let (year, month) = value.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        if !(1..=12).contains(&month) {
            return Err(err());
        }
        Ok(Self {
            year,
            month0: month - 1,
        })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Backward walk over `remaining` months starting at (and including) the anchor.
#[derive(Debug, Clone)]
pub struct LastMonths {
    next: MonthKey,
    remaining: usize,
}

impl Iterator for LastMonths {
    type Item = MonthKey;

    fn next(&mut self) -> Option<MonthKey> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.next = current.previous();
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for LastMonths {}

/// Months of a rolling window, most recent first. Clone the iterator to restart it.
pub fn last_n_months(anchor: MonthKey, n: usize) -> LastMonths {
    LastMonths {
        next: anchor,
        remaining: n,
    }
}

/// Length of the employment income table.
pub const INCOME_WINDOW_MONTHS: usize = 12;

/// Last fully elapsed month relative to `today`.
pub fn default_anchor(today: NaiveDate) -> MonthKey {
    MonthKey::of(today).previous()
}

/// Inclusive date range expressed relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub months_back: u32,
    pub months_forward: u32,
}

impl DateWindow {
    pub const fn new(months_back: u32, months_forward: u32) -> Self {
        Self {
            months_back,
            months_forward,
        }
    }

    pub fn bounds(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let earliest = today.checked_sub_months(Months::new(self.months_back))?;
        let latest = today.checked_add_months(Months::new(self.months_forward))?;
        Some((earliest, latest))
    }

    pub fn contains(self, today: NaiveDate, date: NaiveDate) -> bool {
        self.bounds(today)
            .map(|(earliest, latest)| earliest <= date && date <= latest)
            .unwrap_or(false)
    }
}

/// Income-change effective dates.
pub const INCOME_CHANGE_WINDOW: DateWindow = DateWindow::new(12, 12);
/// End of a fixed-term employment contract.
pub const CONTRACT_END_WINDOW: DateWindow = DateWindow::new(12, 24);
/// Start of the current employment.
pub const EMPLOYMENT_START_WINDOW: DateWindow = DateWindow::new(110 * 12, 0);

/// Birth dates for applicants: at least 18 and at most 120 years old.
pub fn is_adult_birth_date(today: NaiveDate, birth_date: NaiveDate) -> bool {
    let youngest = today.checked_sub_months(Months::new(18 * 12));
    let oldest = today.checked_sub_months(Months::new(120 * 12));
    match (oldest, youngest) {
        (Some(oldest), Some(youngest)) => oldest <= birth_date && birth_date <= youngest,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(year: i32, month0: u32) -> MonthKey {
        MonthKey::new(year, month0).expect("valid month")
    }

    #[test]
    fn january_anchor_rolls_into_previous_year() {
        let months: Vec<MonthKey> = last_n_months(key(2024, 0), 12).collect();

        assert_eq!(months.len(), 12);
        assert_eq!(months[0], key(2024, 0));
        assert_eq!(months[1], key(2023, 11));
        assert_eq!(months[11], key(2023, 1));
        assert_eq!(months.iter().filter(|m| m.year == 2023).count(), 11);
    }

    #[test]
    fn window_is_restartable() {
        let window = last_n_months(key(2025, 5), 3);
        let first: Vec<_> = window.clone().collect();
        let second: Vec<_> = window.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![key(2025, 5), key(2025, 4), key(2025, 3)]);
    }

    #[test]
    fn default_anchor_is_last_elapsed_month() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid");
        assert_eq!(default_anchor(today), key(2025, 11));

        let today = NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid");
        assert_eq!(default_anchor(today), key(2026, 8));
    }

    #[test]
    fn month_key_text_round_trip() {
        let parsed: MonthKey = "2023-12".parse().expect("parses");
        assert_eq!(parsed, key(2023, 11));
        assert_eq!(parsed.to_string(), "2023-12");
        assert!("2023-13".parse::<MonthKey>().is_err());
        assert!("2023".parse::<MonthKey>().is_err());
    }

    #[test]
    fn age_boundary_is_inclusive_at_eighteen() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid");
        let eighteen = NaiveDate::from_ymd_opt(2008, 10, 15).expect("valid");
        let one_day_short = NaiveDate::from_ymd_opt(2008, 10, 16).expect("valid");
        let hundred_twenty = NaiveDate::from_ymd_opt(1906, 10, 15).expect("valid");
        let too_old = NaiveDate::from_ymd_opt(1906, 10, 14).expect("valid");

        assert!(is_adult_birth_date(today, eighteen));
        assert!(!is_adult_birth_date(today, one_day_short));
        assert!(is_adult_birth_date(today, hundred_twenty));
        assert!(!is_adult_birth_date(today, too_old));
    }

    #[test]
    fn category_windows_differ() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid");
        let in_eighteen_months = NaiveDate::from_ymd_opt(2028, 4, 15).expect("valid");

        assert!(!INCOME_CHANGE_WINDOW.contains(today, in_eighteen_months));
        assert!(CONTRACT_END_WINDOW.contains(today, in_eighteen_months));
        assert!(!EMPLOYMENT_START_WINDOW.contains(today, in_eighteen_months));
    }
}
