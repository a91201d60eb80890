use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Weekday index with Monday = 0, matching the order chore days are
/// configured in.
pub fn weekday_index(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}

/// ISO-8601 week number (Monday-start weeks; week 1 contains the year's
/// first Thursday).
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Number of ISO weeks in the ISO year containing `date`. Dec 28 is always
/// in the last week of its ISO year.
pub fn iso_weeks_in_year(date: NaiveDate) -> u32 {
    let iso_year = date.iso_week().year();
    match NaiveDate::from_ymd_opt(iso_year, 12, 28) {
        Some(dec_28) => dec_28.iso_week().week(),
        None => 52,
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days((date.day() - 1) as i64)
}

pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first + Duration::days(days_in_month(date.year(), date.month()) as i64)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_next_month(date) - Duration::days(1)
}

/// Build a date, clipping the day to the length of the target month.
/// Returns `None` only when the year is outside chrono's supported range.
pub fn clipped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

/// Check whether `month` falls in the inclusive first..=last month range.
/// The range wraps across the year boundary when `first_month > last_month`.
pub fn month_in_range(month: u32, first_month: u32, last_month: u32) -> bool {
    if first_month <= last_month {
        first_month <= month && month <= last_month
    } else {
        month >= first_month || month <= last_month
    }
}

/// If `date` is outside the configured month range, move it to the first
/// day of `first_month` — in the next year when the date has already passed
/// a non-wrapping range, in the current year otherwise.
pub fn move_into_range(date: NaiveDate, first_month: u32, last_month: u32) -> NaiveDate {
    if month_in_range(date.month(), first_month, last_month) {
        return date;
    }
    let year = if first_month <= last_month && last_month < date.month() {
        date.year() + 1
    } else {
        date.year()
    };
    NaiveDate::from_ymd_opt(year, first_month, 1).unwrap_or(date)
}

/// Highest week-of-month position that contains `weekday`, counting the
/// month's first (possibly partial) week as position 1.
///
/// With `last_week_must_contain_weekday` the count stops at the week of the
/// month's last occurrence of `weekday`; otherwise the week of the month's
/// last day counts even if that weekday has already passed in it.
pub fn viable_weeks_in_month(
    month_anchor: NaiveDate,
    weekday: Weekday,
    last_week_must_contain_weekday: bool,
) -> i32 {
    let first = first_of_month(month_anchor);
    let last = last_of_month(month_anchor);
    let first_week = iso_week(first) as i32;
    let last_week = if last_week_must_contain_weekday {
        let offset = (weekday_index(last.weekday()) as i64 - weekday_index(weekday) as i64)
            .rem_euclid(7);
        iso_week(last - Duration::days(offset)) as i32
    } else {
        iso_week(last) as i32
    };
    // A month's last days can land in week 1 of the next ISO year.
    let last_week = if last_week < first_week {
        last_week + iso_weeks_in_year(first) as i32
    } else {
        last_week
    };
    last_week - first_week + 1
}

/// Resolve the `order`-th occurrence of `weekday` in the month containing
/// `month_anchor`. Positive orders count occurrences from the 1st; negative
/// orders count back from the last occurrence (-1 = last). The result can
/// spill into the next month for orders larger than the month holds.
pub fn nth_weekday_of_month(order: i32, month_anchor: NaiveDate, weekday: Weekday) -> NaiveDate {
    let first = first_of_month(month_anchor);
    let actual_order = if order > 0 {
        order
    } else {
        (viable_weeks_in_month(month_anchor, weekday, true) + order + 1).max(1)
    };
    let day_offset = weekday_index(weekday) as i64 - weekday_index(first.weekday()) as i64
        + (actual_order as i64 - 1) * 7;
    if weekday_index(weekday) >= weekday_index(first.weekday()) || order < 0 {
        first + Duration::days(day_offset)
    } else {
        // First occurrence is in the month's second week.
        first + Duration::days(day_offset + 7)
    }
}

/// Resolve `weekday` in the `order`-th week of the month containing
/// `month_anchor`, counting the month's first partial week as week 1. This
/// can differ from `nth_weekday_of_month` for the same inputs, and can
/// yield a date in the previous month when the first week does not contain
/// the weekday.
pub fn nth_week_of_month(order: i32, month_anchor: NaiveDate, weekday: Weekday) -> NaiveDate {
    let first = first_of_month(month_anchor);
    let actual_order = if order > 0 {
        order
    } else {
        (viable_weeks_in_month(month_anchor, weekday, false) + order + 1).max(1)
    };
    first
        + Duration::days(
            weekday_index(weekday) as i64 - weekday_index(first.weekday()) as i64
                + (actual_order as i64 - 1) * 7,
        )
}
