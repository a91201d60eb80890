use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::config::{ChoreConfig, Frequency};
use crate::date_math::{
    clipped_date, first_of_month, first_of_next_month, iso_week, move_into_range,
    nth_week_of_month, nth_weekday_of_month, weekday_index,
};
use crate::error::ChoreError;

/// Bound on the week-by-week and month-by-month phase-alignment searches.
/// A period and month range that never align give up with "no candidate"
/// instead of looping unbounded.
const MAX_PHASE_STEPS: u32 = 208;

/// Recurrence class shared by the "every-*" and "after-*" spelling of a
/// frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrequencyClass {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Blank,
}

fn class_of(frequency: Frequency) -> FrequencyClass {
    match frequency {
        Frequency::EveryNDays | Frequency::AfterNDays => FrequencyClass::Daily,
        Frequency::EveryNWeeks | Frequency::AfterNWeeks => FrequencyClass::Weekly,
        Frequency::EveryNMonths | Frequency::AfterNMonths => FrequencyClass::Monthly,
        Frequency::EveryNYears | Frequency::AfterNYears => FrequencyClass::Yearly,
        Frequency::Blank => FrequencyClass::Blank,
    }
}

/// `date` plus `months` calendar months, day clipped to the target month.
fn months_later(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.month0() as i64 + months as i64;
    let year = date.year() + (total / 12) as i32;
    let month = (total % 12) as u32 + 1;
    clipped_date(year, month, date.day())
}

fn years_later(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    clipped_date(date.year() + years as i32, date.month(), date.day())
}

/// Period length in days for the daily class, or a configuration error
/// when it is missing. Other classes default to a period of 1.
fn daily_period(config: &ChoreConfig) -> Result<u32, ChoreError> {
    config.period.ok_or_else(|| {
        ChoreError::configuration(
            &config.name,
            "start_date and period are required for every-n-days and after-n-days frequencies",
        )
    })
}

/// Start of the schedule window: the configured start date (or its
/// default), bumped past the last completion, moved into the month range.
pub fn window_start(
    config: &ChoreConfig,
    last_completed: Option<NaiveDateTime>,
    today: NaiveDate,
) -> NaiveDate {
    let mut start = config.start_date_or_default(today);
    if let Some(completed) = last_completed.map(|dt| dt.date()) {
        if completed > start {
            start = completed;
        } else if completed == start {
            start += Duration::days(1);
        }
    }
    move_into_range(start, config.first_month, config.last_month)
}

/// Anchor date the recurrence grid is phased against. For "after-*"
/// frequencies the last completion plus one period can push it later than
/// the configured start date.
fn schedule_start(
    config: &ChoreConfig,
    last_completed: Option<NaiveDateTime>,
    today: NaiveDate,
) -> Result<NaiveDate, ChoreError> {
    let mut start = config.start_date_or_default(today);
    if config.frequency.is_after() {
        if let Some(completed) = last_completed.map(|dt| dt.date()) {
            let earliest = match class_of(config.frequency) {
                FrequencyClass::Daily => {
                    Some(completed + Duration::days(daily_period(config)? as i64))
                }
                FrequencyClass::Weekly => {
                    Some(completed + Duration::weeks(config.period_or_default() as i64))
                }
                FrequencyClass::Monthly => months_later(completed, config.period_or_default()),
                FrequencyClass::Yearly => years_later(completed, config.period_or_default()),
                FrequencyClass::Blank => None,
            };
            if let Some(earliest) = earliest {
                if earliest > start {
                    start = earliest;
                }
            }
        }
    }
    Ok(start)
}

/// Find the next rule-derived candidate date at or after `search_from`.
///
/// `as_of` is the single wall-clock reading for the whole recomputation
/// pass; it drives the completed-today suppression. `Ok(None)` means the
/// rule has no candidate (manual frequency, or a phase search that never
/// aligned), which is a normal outcome.
pub fn find_candidate(
    config: &ChoreConfig,
    last_completed: Option<NaiveDateTime>,
    search_from: NaiveDate,
    as_of: NaiveDateTime,
) -> Result<Option<NaiveDate>, ChoreError> {
    if config.frequency.is_blank() {
        return Ok(None);
    }
    let class = class_of(config.frequency);

    let today = as_of.date();
    let anchor = schedule_start(config, last_completed, today)?;
    let window = window_start(config, last_completed, today);

    let mut day1 = search_from.max(window).max(anchor);
    // A chore completed today is not offered again today.
    if day1 == today && last_completed.map(|dt| dt.date()) == Some(today) {
        day1 += Duration::days(1);
    }

    match class {
        FrequencyClass::Daily => daily_candidate(config, day1, anchor).map(Some),
        FrequencyClass::Weekly => Ok(weekly_candidate(config, day1, anchor)),
        FrequencyClass::Monthly => monthly_candidate(config, last_completed, day1, anchor),
        FrequencyClass::Yearly => Ok(yearly_candidate(config, day1, anchor)),
        FrequencyClass::Blank => Ok(None),
    }
}

fn daily_candidate(
    config: &ChoreConfig,
    day1: NaiveDate,
    anchor: NaiveDate,
) -> Result<NaiveDate, ChoreError> {
    let period = daily_period(config)? as i64;
    let remainder = (day1 - anchor).num_days().rem_euclid(period);
    if remainder == 0 {
        Ok(day1)
    } else {
        Ok(day1 + Duration::days(period - remainder))
    }
}

fn weekly_candidate(config: &ChoreConfig, day1: NaiveDate, anchor: NaiveDate) -> Option<NaiveDate> {
    let period = config.period_or_default() as i64;
    let anchor_week = iso_week(anchor) as i64;
    let weekday = weekday_index(day1.weekday()) as i64;
    // When no chore day is set the start date's weekday repeats.
    let day_index = weekday_index(config.chore_day.unwrap_or_else(|| anchor.weekday())) as i64;

    let week = iso_week(day1) as i64;
    if (week - anchor_week).rem_euclid(period) == 0 && day_index >= weekday {
        // Chore week, and the chore day has not passed yet (same day counts).
        return Some(day1 + Duration::days(day_index - weekday));
    }

    let mut offset = 7 - weekday + day_index;
    for _ in 0..MAX_PHASE_STEPS {
        let candidate = day1 + Duration::days(offset);
        if (iso_week(candidate) as i64 - anchor_week).rem_euclid(period) == 0 {
            return Some(candidate);
        }
        offset += 7;
    }
    None
}

/// One month's resolution for the monthly strategies. Returns the resolved
/// date together with the first day of the month it is attributed to; the
/// date itself can spill outside that month for large ordinals.
fn monthly_resolution(
    config: &ChoreConfig,
    day1: NaiveDate,
    anchor: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let this_month = first_of_month(day1);
    let next_month = first_of_next_month(day1);

    let Some(chore_day) = config.chore_day else {
        // Fixed day-of-month mode; the anchor's day repeats when unset.
        let day = config.day_of_month.unwrap_or(anchor.day());
        let candidate = clipped_date(day1.year(), day1.month(), day)?;
        if day1 <= candidate {
            return Some((candidate, this_month));
        }
        let candidate = clipped_date(next_month.year(), next_month.month(), day)?;
        return Some((candidate, next_month));
    };

    let order = config.weekday_order_number.unwrap_or(1);
    let resolve = |month_anchor: NaiveDate, chore_day: Weekday| {
        if config.force_week_numbers {
            nth_week_of_month(order, month_anchor, chore_day)
        } else {
            nth_weekday_of_month(order, month_anchor, chore_day)
        }
    };

    let candidate = resolve(this_month, chore_day);
    if candidate >= day1 {
        return Some((candidate, this_month));
    }
    Some((resolve(next_month, chore_day), next_month))
}

fn monthly_candidate(
    config: &ChoreConfig,
    last_completed: Option<NaiveDateTime>,
    day1: NaiveDate,
    anchor: NaiveDate,
) -> Result<Option<NaiveDate>, ChoreError> {
    let mut day1 = day1;
    // A completion this month pushes the search into the next month.
    if let Some(completed) = last_completed.map(|dt| dt.date()) {
        if completed.year() == day1.year() && completed.month() == day1.month() {
            day1 = first_of_next_month(day1);
        }
    }

    let period = config.period_or_default() as i64;
    let Some((mut candidate, mut month_anchor)) = monthly_resolution(config, day1, anchor) else {
        return Ok(None);
    };

    if period > 1 {
        let mut aligned = false;
        for _ in 0..MAX_PHASE_STEPS {
            if (month_anchor.month() as i64 - anchor.month() as i64).rem_euclid(period) == 0 {
                aligned = true;
                break;
            }
            let next = first_of_next_month(month_anchor);
            match monthly_resolution(config, next, anchor) {
                Some((date, attributed)) => {
                    candidate = date;
                    month_anchor = attributed;
                }
                None => return Ok(None),
            }
        }
        if !aligned {
            return Ok(None);
        }
    }

    Ok(Some(candidate + Duration::days(config.due_date_offset as i64)))
}

fn yearly_candidate(config: &ChoreConfig, day1: NaiveDate, anchor: NaiveDate) -> Option<NaiveDate> {
    let period = config.period_or_default() as i32;
    let (month, day) = match config.date {
        Some(md) => (md.month, md.day),
        None => (anchor.month(), anchor.day()),
    };
    // Feb 29 clips to Feb 28 in non-leap target years.
    let mut candidate = clipped_date(day1.year(), month, day)?;
    if candidate < day1 {
        candidate = clipped_date(day1.year() + 1, month, day)?;
    }
    let difference = (candidate.year() - anchor.year()).abs();
    if difference > 0 {
        let remainder = difference % period;
        if remainder > 0 {
            candidate = clipped_date(candidate.year() + period - remainder, month, day)?;
        }
    }
    Some(candidate)
}
