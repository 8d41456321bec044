//! Calendar dates in `YYYY-MM-DD` form

use chrono::NaiveDate;

/// Parses `YYYY-MM-DD` into a date that actually exists.
///
/// Exactly three `-`-separated integer components are required, and the
/// day must exist in that month: `2024-02-30` and `2023-02-29` are `None`.
#[must_use]
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.trim().split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    let day = day.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whether `value` names a real calendar date.
#[must_use]
pub fn is_valid_calendar_date(value: &str) -> bool {
    parse_calendar_date(value).is_some()
}

/// Whether `date` lies a whole number of `step_days` away from `base`.
#[must_use]
pub fn is_on_day_step(date: NaiveDate, base: NaiveDate, step_days: i64) -> bool {
    if step_days <= 0 {
        return false;
    }
    (date - base).num_days() % step_days == 0
}
