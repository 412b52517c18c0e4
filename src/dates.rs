//! Calendar dates for due dates and the clock that supplies "today".
//!
//! Due dates are kept as a `YYYY-MM-DD` triple rather than a
//! [`NaiveDate`]: validation follows a coarse per-month rule that accepts a
//! few dates the calendar does not have (`2023-02-29`, `2024-02-30` is still
//! rejected because February is capped at 29). Arithmetic normalises such
//! dates forward the same way `mktime` does, so `2023-02-29` behaves like
//! `2023-03-01`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::TaskError;

/// Look-ahead window, in days, for "due soon" reminders.
pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

/// Supplies the current calendar date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date. Used by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        FixedClock(date)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// A due date in canonical `YYYY-MM-DD` form.
///
/// The derived ordering (year, month, day) is the same as comparing the
/// zero-padded text, which is how due dates are compared everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate {
    year: i32,
    month: u32,
    day: u32,
}

impl DueDate {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Today's date according to `clock`.
    pub fn today(clock: &impl Clock) -> Self {
        DueDate::from(clock.today())
    }

    /// Maps the date onto the real calendar, rolling overflowing days into
    /// the following month.
    pub fn to_naive(self) -> NaiveDate {
        first_of_month(self.year, i64::from(self.month) - 1) + Duration::days(i64::from(self.day) - 1)
    }
}

impl From<NaiveDate> for DueDate {
    fn from(d: NaiveDate) -> Self {
        DueDate {
            year: d.year(),
            month: d.month(),
            day: d.day(),
        }
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for DueDate {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coarse(s)
            .ok_or_else(|| TaskError::invalid(format!("'{}' is not a valid date, use YYYY-MM-DD", s)))
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Returns `true` if `text` is `NNNN-NN-NN` with a month in 1..=12 and a
/// day in 1..=31, at most 30 for April, June, September and November and at
/// most 29 for February. Leap years are not considered.
pub fn is_valid_date(text: &str) -> bool {
    parse_coarse(text).is_some()
}

fn parse_coarse(text: &str) -> Option<DueDate> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }

    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[5..7].parse().ok()?;
    let day: u32 = text[8..10].parse().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    if matches!(month, 4 | 6 | 9 | 11) && day > 30 {
        return None;
    }
    if month == 2 && day > 29 {
        return None;
    }
    Some(DueDate { year, month, day })
}

/// First day of the month `month0` months (0-based) after January of `year`.
fn first_of_month(year: i32, month0: i64) -> NaiveDate {
    let total = i64::from(year) * 12 + month0;
    let y = i32::try_from(total.div_euclid(12)).unwrap_or(i32::MAX);
    let m = u32::try_from(total.rem_euclid(12) + 1).unwrap_or(1);
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(NaiveDate::MAX)
}

/// `true` if `date` is strictly before today.
pub fn is_overdue(date: DueDate, today: NaiveDate) -> bool {
    date < DueDate::from(today)
}

/// `true` if `today <= date <= today + horizon_days`.
pub fn is_due_soon(date: DueDate, today: NaiveDate, horizon_days: i64) -> bool {
    let start = DueDate::from(today);
    let end = add_days(start, horizon_days);
    start <= date && date <= end
}

/// Saturates at the calendar's limits instead of overflowing.
pub fn add_days(date: DueDate, n: i64) -> DueDate {
    let naive = date.to_naive();
    let shifted = Duration::try_days(n)
        .and_then(|delta| naive.checked_add_signed(delta))
        .unwrap_or(if n < 0 { NaiveDate::MIN } else { NaiveDate::MAX });
    DueDate::from(shifted)
}

pub fn add_weeks(date: DueDate, n: i64) -> DueDate {
    add_days(date, n.saturating_mul(7))
}

/// Advances the month field by `n` and then normalises the day, so
/// January 31st plus one month lands in early March.
pub fn add_months(date: DueDate, n: i64) -> DueDate {
    let base = first_of_month(date.year, i64::from(date.month) - 1 + n);
    DueDate::from(base + Duration::days(i64::from(date.day) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> DueDate {
        s.parse().unwrap()
    }

    fn naive(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn coarse_validation_rules() {
        assert!(is_valid_date("2024-01-31"));
        assert!(is_valid_date("2023-02-29"));
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2024-02-30"));
        assert!(!is_valid_date("2024-04-31"));
        assert!(!is_valid_date("2024-13-01"));
        assert!(!is_valid_date("2024-00-10"));
        assert!(!is_valid_date("2024-01-00"));
        assert!(!is_valid_date("2024-1-01"));
        assert!(!is_valid_date("2024/01/01"));
        assert!(!is_valid_date("20x4-01-01"));
        assert!(!is_valid_date(""));
    }

    #[test]
    fn ordering_matches_text_ordering() {
        assert!(d("2024-01-05") < d("2024-03-01"));
        assert!(d("2023-12-31") < d("2024-01-01"));
        assert_eq!(d("2024-07-04").to_string(), "2024-07-04");
    }

    #[test]
    fn invalid_day_rolls_forward() {
        assert_eq!(d("2023-02-29").to_naive(), naive(2023, 3, 1));
        assert_eq!(add_days(d("2023-02-29"), 0), d("2023-03-01"));
    }

    #[test]
    fn arithmetic_normalises_overflow() {
        assert_eq!(add_days(d("2024-12-31"), 1), d("2025-01-01"));
        assert_eq!(add_weeks(d("2024-02-26"), 1), d("2024-03-04"));
        assert_eq!(add_months(d("2024-12-15"), 1), d("2025-01-15"));
        assert_eq!(add_months(d("2023-01-31"), 1), d("2023-03-03"));
        assert_eq!(add_months(d("2024-01-31"), 1), d("2024-03-02"));
    }

    #[test]
    fn overdue_and_due_soon() {
        let today = naive(2024, 6, 1);
        assert!(is_overdue(d("2020-01-01"), today));
        assert!(!is_overdue(d("2024-06-01"), today));

        assert!(!is_due_soon(d("2024-05-31"), today, 3));
        assert!(is_due_soon(d("2024-06-01"), today, 3));
        assert!(is_due_soon(d("2024-06-04"), today, 3));
        assert!(!is_due_soon(d("2024-06-05"), today, 3));
    }

    #[test]
    fn huge_offsets_saturate() {
        let today = naive(2024, 6, 1);
        assert!(is_due_soon(d("2030-01-01"), today, i64::MAX));
        assert_eq!(add_days(d("2024-06-01"), i64::MIN).to_naive(), NaiveDate::MIN);
        assert_eq!(add_weeks(d("2024-06-01"), i64::MAX).to_naive(), NaiveDate::MAX);
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        let clock = FixedClock::new(naive(2024, 6, 1));
        assert_eq!(DueDate::today(&clock), d("2024-06-01"));
    }
}
