//! Date arithmetic used across modules (tenure, ages, spans).

use chrono::{Datelike, NaiveDate};

use crate::error::{HrError, HrResult};

/// Completed years between `from` and `today`.
///
/// A year only counts once `today` has reached the anniversary of `from`.
pub fn whole_years_between(from: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - from.year();
    if (today.month(), today.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}

/// Calendar months between `start` and `end` (or `today` when open-ended),
/// never less than one.
pub fn duration_months(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> i32 {
    let end = end.unwrap_or(today);
    let months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    months.max(1)
}

/// Inclusive day count of `[start, end]`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> HrResult<i64> {
    ensure_ordered(start, end)?;
    Ok((end - start).num_days() + 1)
}

pub fn ensure_ordered(start: NaiveDate, end: NaiveDate) -> HrResult<()> {
    if end < start {
        return Err(HrError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Whether `today` falls inside `[start, end]`; an open end never closes.
pub fn within(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> bool {
    start <= today && end.map_or(true, |end| today <= end)
}

/// Days from `today` until `target` (negative once passed).
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn years_wait_for_the_anniversary() {
        assert_eq!(whole_years_between(d(2020, 3, 15), d(2023, 3, 14)), 2);
        assert_eq!(whole_years_between(d(2020, 3, 15), d(2023, 3, 15)), 3);
        assert_eq!(whole_years_between(d(2020, 3, 15), d(2020, 12, 31)), 0);
    }

    #[test]
    fn duration_months_has_a_floor_of_one() {
        assert_eq!(duration_months(d(2024, 5, 1), Some(d(2024, 5, 30)), d(2030, 1, 1)), 1);
        assert_eq!(duration_months(d(2022, 11, 20), Some(d(2024, 2, 1)), d(2030, 1, 1)), 15);
    }

    #[test]
    fn open_ended_duration_uses_today() {
        assert_eq!(duration_months(d(2024, 1, 10), None, d(2024, 7, 1)), 6);
    }

    #[test]
    fn inclusive_days_counts_both_ends() {
        assert_eq!(inclusive_days(d(2024, 6, 3), d(2024, 6, 7)).unwrap(), 5);
        assert_eq!(inclusive_days(d(2024, 6, 3), d(2024, 6, 3)).unwrap(), 1);
        assert!(matches!(
            inclusive_days(d(2024, 6, 7), d(2024, 6, 3)),
            Err(HrError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn within_handles_open_ranges() {
        assert!(within(d(2024, 1, 1), None, d(2030, 1, 1)));
        assert!(within(d(2024, 1, 1), Some(d(2024, 12, 31)), d(2024, 12, 31)));
        assert!(!within(d(2024, 1, 1), Some(d(2024, 12, 31)), d(2025, 1, 1)));
        assert!(!within(d(2024, 1, 2), None, d(2024, 1, 1)));
    }
}
