use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::ChoreConfig;
use crate::overrides::Overrides;
use crate::rule::window_start;
use crate::schedule::build_schedule;

/// Mutable state of a single chore, persisted by the host between runs.
///
/// `due_dates` and the display attributes are derived and rebuilt on every
/// recompute; they are serialized only so the host can render them without
/// calling back into the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub due_dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
    /// Days until the next due date; negative when overdue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(default)]
    pub overdue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdue_days: Option<i64>,
    #[serde(flatten)]
    pub overrides: Overrides,
}

/// Pick the next due date from a sorted schedule.
///
/// Scans for the first entry at or after `as_of`'s date. Unless
/// `ignore_today` is set, a today-dated entry is skipped once the day has
/// expired or the chore was already completed today at or before the
/// current time of day.
pub fn select_next_due(
    due_dates: &[NaiveDate],
    as_of: NaiveDateTime,
    last_completed: Option<NaiveDateTime>,
    ignore_today: bool,
) -> Option<NaiveDate> {
    let today = as_of.date();
    let expiration = NaiveTime::from_hms_opt(23, 59, 59)?;
    for &date in due_dates {
        if date < today {
            continue;
        }
        if !ignore_today && date == today {
            let completed_today = last_completed
                .map(|done| done.date() == today && as_of.time() >= done.time())
                .unwrap_or(false);
            if as_of.time() > expiration || completed_today {
                continue;
            }
        }
        return Some(date);
    }
    None
}

/// Rebuild the schedule and derived attributes. Pure in `(config, state,
/// as_of)`; `as_of` is the single wall-clock reading for the whole pass.
pub fn recompute(config: &ChoreConfig, state: &ChoreState, as_of: NaiveDateTime) -> ChoreState {
    let mut next = state.clone();
    let today = as_of.date();

    next.due_dates = build_schedule(config, &state.overrides, state.last_completed, as_of);
    next.next_due_date = select_next_due(&next.due_dates, as_of, state.last_completed, false);

    match next.next_due_date {
        Some(due) => {
            let days = (due - today).num_days();
            log::debug!(
                "({}) next due date {due}, that is in {days} days",
                config.name
            );
            next.days = Some(days);
            next.overdue = days < 0;
            next.overdue_days = Some(if days > -1 { 0 } else { -days });
        }
        None => {
            next.days = None;
            next.overdue = false;
            next.overdue_days = None;
        }
    }

    // Overrides that fell behind the window can no longer match anything.
    let window = window_start(config, state.last_completed, today);
    next.overrides.prune_before(window);
    next.last_updated = Some(as_of);
    next
}

/// Record a completion and rebuild the schedule around it.
pub fn record_completion(
    config: &ChoreConfig,
    state: &ChoreState,
    completed_at: NaiveDateTime,
    as_of: NaiveDateTime,
) -> ChoreState {
    let mut next = state.clone();
    next.last_completed = Some(completed_at);
    recompute(config, &next, as_of)
}

/// Force a date into the schedule, then rebuild.
pub fn add_override_date(
    config: &ChoreConfig,
    state: &ChoreState,
    date: NaiveDate,
    as_of: NaiveDateTime,
) -> ChoreState {
    let mut next = state.clone();
    if !next.overrides.add_date(date) {
        log::warn!("({}) {date} was already added", config.name);
    }
    recompute(config, &next, as_of)
}

/// Exclude a date from the schedule, then rebuild. Defaults to the current
/// next due date when no date is given.
pub fn remove_override_date(
    config: &ChoreConfig,
    state: &ChoreState,
    date: Option<NaiveDate>,
    as_of: NaiveDateTime,
) -> ChoreState {
    let Some(date) = date.or(state.next_due_date) else {
        log::warn!("({}) no date to remove", config.name);
        return state.clone();
    };
    let mut next = state.clone();
    if !next.overrides.remove_date(date) {
        log::warn!("({}) {date} was already removed", config.name);
    }
    recompute(config, &next, as_of)
}

/// Shift a single occurrence by `offset` days, then rebuild. Defaults to
/// the current next due date when no date is given.
pub fn offset_override_date(
    config: &ChoreConfig,
    state: &ChoreState,
    date: Option<NaiveDate>,
    offset: i32,
    as_of: NaiveDateTime,
) -> ChoreState {
    let Some(date) = date.or(state.next_due_date) else {
        log::warn!("({}) no date to offset", config.name);
        return state.clone();
    };
    let mut next = state.clone();
    next.overrides.offset_date(date, offset);
    recompute(config, &next, as_of)
}

/// Once-per-day recompute throttle: a state updated earlier today is left
/// alone, unless the chore is due today and was completed today (the
/// completion must be reflected immediately).
pub fn needs_update(state: &ChoreState, as_of: NaiveDateTime) -> bool {
    let today = as_of.date();
    let Some(updated) = state.last_updated else {
        return true;
    };
    if state.next_due_date == Some(today)
        && state.last_completed.map(|done| done.date()) == Some(today)
    {
        return true;
    }
    updated.date() != today
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        d(year, month, day).and_hms_opt(hour, minute, 0).unwrap()
    }

    fn config(json: &str) -> ChoreConfig {
        ChoreConfig::from_json(json).unwrap()
    }

    fn daily_config() -> ChoreConfig {
        config(
            r#"{"name": "Vacuum", "frequency": "every-n-days",
                "period": 3, "start_date": "2024-01-01"}"#,
        )
    }

    #[test]
    fn test_recompute_scenario_every_three_days() {
        let state = recompute(&daily_config(), &ChoreState::default(), dt(2024, 1, 5, 10, 0));
        assert_eq!(state.next_due_date, Some(d(2024, 1, 7)));
        assert_eq!(state.days, Some(2));
        assert!(!state.overdue);
        assert_eq!(state.overdue_days, Some(0));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let as_of = dt(2024, 1, 5, 10, 0);
        let config = daily_config();
        let once = recompute(&config, &ChoreState::default(), as_of);
        let twice = recompute(&config, &once, as_of);
        assert_eq!(once.due_dates, twice.due_dates);
        assert_eq!(once.next_due_date, twice.next_due_date);
        assert_eq!(once.days, twice.days);
    }

    #[test]
    fn test_recompute_without_next_due_clears_attributes() {
        let config = config(r#"{"name": "Whenever", "frequency": "blank"}"#);
        let state = recompute(&config, &ChoreState::default(), dt(2024, 1, 5, 10, 0));
        assert_eq!(state.next_due_date, None);
        assert_eq!(state.days, None);
        assert!(!state.overdue);
        assert_eq!(state.overdue_days, None);
    }

    #[test]
    fn test_select_skips_today_after_completion() {
        let today = d(2024, 1, 5);
        let dates = vec![today, d(2024, 1, 8)];
        let completed = Some(dt(2024, 1, 5, 9, 0));
        // Completed at 09:00, asked at 10:00: today is no longer offered.
        let next = select_next_due(&dates, dt(2024, 1, 5, 10, 0), completed, false);
        assert_eq!(next, Some(d(2024, 1, 8)));
    }

    #[test]
    fn test_select_keeps_today_before_completion_time() {
        let today = d(2024, 1, 5);
        let dates = vec![today, d(2024, 1, 8)];
        // Completion recorded for later today; at 10:00 it has not
        // happened yet.
        let completed = Some(dt(2024, 1, 5, 11, 0));
        let next = select_next_due(&dates, dt(2024, 1, 5, 10, 0), completed, false);
        assert_eq!(next, Some(today));
    }

    #[test]
    fn test_select_ignore_today_returns_today() {
        let today = d(2024, 1, 5);
        let dates = vec![today, d(2024, 1, 8)];
        let completed = Some(dt(2024, 1, 5, 9, 0));
        let next = select_next_due(&dates, dt(2024, 1, 5, 10, 0), completed, true);
        assert_eq!(next, Some(today));
    }

    #[test]
    fn test_select_skips_past_dates() {
        let dates = vec![d(2024, 1, 1), d(2024, 1, 4), d(2024, 1, 7)];
        let next = select_next_due(&dates, dt(2024, 1, 5, 10, 0), None, false);
        assert_eq!(next, Some(d(2024, 1, 7)));
    }

    #[test]
    fn test_record_completion_reschedules_after_frequency() {
        let config = config(
            r#"{"name": "Litter", "frequency": "after-n-days",
                "period": 5, "start_date": "2024-01-01"}"#,
        );
        let as_of = dt(2024, 1, 10, 9, 0);
        let state = record_completion(&config, &ChoreState::default(), as_of, as_of);
        assert_eq!(state.last_completed, Some(as_of));
        assert_eq!(state.next_due_date, Some(d(2024, 1, 15)));
    }

    #[test]
    fn test_add_override_appears_in_schedule() {
        let as_of = dt(2024, 1, 5, 10, 0);
        let state = add_override_date(&daily_config(), &ChoreState::default(), d(2024, 1, 9), as_of);
        assert!(state.due_dates.contains(&d(2024, 1, 9)));
    }

    #[test]
    fn test_remove_override_defaults_to_next_due() {
        let config = daily_config();
        let as_of = dt(2024, 1, 5, 10, 0);
        let state = recompute(&config, &ChoreState::default(), as_of);
        assert_eq!(state.next_due_date, Some(d(2024, 1, 7)));
        let state = remove_override_date(&config, &state, None, as_of);
        assert_eq!(state.next_due_date, Some(d(2024, 1, 10)));
        assert!(!state.due_dates.contains(&d(2024, 1, 7)));
    }

    #[test]
    fn test_offset_override_shifts_next_due() {
        let config = daily_config();
        let as_of = dt(2024, 1, 5, 10, 0);
        let state = recompute(&config, &ChoreState::default(), as_of);
        let state = offset_override_date(&config, &state, None, 2, as_of);
        assert_eq!(state.next_due_date, Some(d(2024, 1, 9)));
        // The following candidate is unaffected by the shift.
        assert!(state.due_dates.contains(&d(2024, 1, 10)));
    }

    #[test]
    fn test_stale_overrides_are_pruned() {
        let config = daily_config();
        let mut state = ChoreState::default();
        state.overrides.remove_date(d(2023, 6, 1));
        state.overrides.add_date(d(2024, 1, 9));
        let state = recompute(&config, &state, dt(2024, 1, 5, 10, 0));
        assert!(state.overrides.remove.is_empty());
        assert!(state.overrides.add.contains(&d(2024, 1, 9)));
    }

    #[test]
    fn test_needs_update_once_per_day() {
        let config = daily_config();
        let morning = dt(2024, 1, 5, 8, 0);
        let state = recompute(&config, &ChoreState::default(), morning);
        assert!(!needs_update(&state, dt(2024, 1, 5, 12, 0)));
        assert!(needs_update(&state, dt(2024, 1, 6, 8, 0)));
    }

    #[test]
    fn test_needs_update_exception_when_completed_today() {
        let mut state = ChoreState::default();
        state.last_updated = Some(dt(2024, 1, 5, 8, 0));
        state.next_due_date = Some(d(2024, 1, 5));
        state.last_completed = Some(dt(2024, 1, 5, 9, 0));
        assert!(needs_update(&state, dt(2024, 1, 5, 10, 0)));
    }

    #[test]
    fn test_state_serde_round_trip() {
        let config = daily_config();
        let as_of = dt(2024, 1, 5, 10, 0);
        let mut state = recompute(&config, &ChoreState::default(), as_of);
        state.overrides.offset_date(d(2024, 1, 10), -1);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"offset_dates\":\"2024-01-10:-1\""));
        let back: ChoreState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
