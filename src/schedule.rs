use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::ChoreConfig;
use crate::date_math::move_into_range;
use crate::overrides::Overrides;
use crate::rule::{find_candidate, window_start};

/// Build the chore's due-date schedule: rule candidates within the month
/// range, merged with the manual overrides, sorted and deduplicated.
///
/// The scan is bounded by `forecast_dates + 1` iterations, so a rule whose
/// phase never aligns with the month range terminates with whatever was
/// found. A configuration error from the rule stops the build and leaves
/// the remainder of the schedule empty; it never aborts the caller.
pub fn build_schedule(
    config: &ChoreConfig,
    overrides: &Overrides,
    last_completed: Option<NaiveDateTime>,
    as_of: NaiveDateTime,
) -> Vec<NaiveDate> {
    log::debug!("({}) loading due dates", config.name);
    let mut dates = Vec::new();
    let mut cursor = window_start(config, last_completed, as_of.date());

    for _ in 0..=config.forecast_dates {
        let candidate = match find_candidate(config, last_completed, cursor, as_of) {
            Ok(Some(date)) => date,
            Ok(None) => break,
            Err(err) => {
                log::warn!("{err}; schedule left empty");
                break;
            }
        };

        let moved = move_into_range(candidate, config.first_month, config.last_month);
        if moved != candidate {
            // Outside the month range: restart the scan from the range,
            // spending the iteration without emitting.
            cursor = moved;
            continue;
        }

        if !overrides.remove.contains(&candidate) {
            let due = match overrides.offsets.get(&candidate) {
                Some(offset) => candidate + Duration::days(*offset as i64),
                None => candidate,
            };
            dates.push(due);
        }
        // The cursor always advances from the unshifted candidate.
        cursor = candidate + Duration::days(1);
    }

    // Added dates are taken verbatim: no range or rule checks, but removal
    // still wins.
    dates.extend(
        overrides
            .add
            .iter()
            .filter(|d| !overrides.remove.contains(d)),
    );
    dates.sort();
    dates.dedup();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::month_in_range;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn dt(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        d(year, month, day).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn config(json: &str) -> ChoreConfig {
        ChoreConfig::from_json(json).unwrap()
    }

    #[test]
    fn test_daily_schedule_is_sorted_and_unique() {
        let config = config(
            r#"{"name": "Vacuum", "frequency": "every-n-days",
                "period": 3, "start_date": "2024-01-01", "forecast_dates": 4}"#,
        );
        let dates = build_schedule(&config, &Overrides::default(), None, dt(2024, 1, 1, 8));
        assert_eq!(
            dates,
            vec![
                d(2024, 1, 1),
                d(2024, 1, 4),
                d(2024, 1, 7),
                d(2024, 1, 10),
                d(2024, 1, 13),
            ]
        );
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_removed_date_is_skipped() {
        let config = config(
            r#"{"name": "Vacuum", "frequency": "every-n-days",
                "period": 3, "start_date": "2024-01-01", "forecast_dates": 4}"#,
        );
        let mut overrides = Overrides::default();
        overrides.remove_date(d(2024, 1, 4));
        let dates = build_schedule(&config, &overrides, None, dt(2024, 1, 1, 8));
        assert!(!dates.contains(&d(2024, 1, 4)));
        // The scan continues past the removed date.
        assert!(dates.contains(&d(2024, 1, 7)));
    }

    #[test]
    fn test_removal_wins_over_add() {
        let config = config(
            r#"{"name": "Vacuum", "frequency": "every-n-days",
                "period": 3, "start_date": "2024-03-01", "forecast_dates": 3}"#,
        );
        let mut overrides = Overrides::default();
        overrides.remove_date(d(2024, 3, 1));
        overrides.add_date(d(2024, 3, 1));
        let dates = build_schedule(&config, &overrides, None, dt(2024, 3, 1, 8));
        assert!(!dates.contains(&d(2024, 3, 1)));
    }

    #[test]
    fn test_offset_shifts_date_but_not_cursor() {
        let config = config(
            r#"{"name": "Vacuum", "frequency": "every-n-days",
                "period": 3, "start_date": "2024-01-01", "forecast_dates": 3}"#,
        );
        let mut overrides = Overrides::default();
        overrides.offset_date(d(2024, 1, 4), 2);
        let dates = build_schedule(&config, &overrides, None, dt(2024, 1, 1, 8));
        // Jan 4 is shifted to Jan 6; the following candidates are untouched.
        assert_eq!(
            dates,
            vec![d(2024, 1, 1), d(2024, 1, 6), d(2024, 1, 7), d(2024, 1, 10)]
        );
    }

    #[test]
    fn test_rule_dates_respect_month_range() {
        let config = config(
            r#"{"name": "Garden", "frequency": "every-n-days",
                "period": 10, "start_date": "2024-01-01",
                "first_month": 3, "last_month": 4, "forecast_dates": 8}"#,
        );
        let dates = build_schedule(&config, &Overrides::default(), None, dt(2024, 1, 1, 8));
        assert!(!dates.is_empty());
        assert!(dates.iter().all(|d| {
            use chrono::Datelike;
            month_in_range(d.month(), 3, 4)
        }));
    }

    #[test]
    fn test_added_dates_bypass_month_range() {
        let config = config(
            r#"{"name": "Garden", "frequency": "every-n-days",
                "period": 10, "start_date": "2024-01-01",
                "first_month": 3, "last_month": 4, "forecast_dates": 3}"#,
        );
        let mut overrides = Overrides::default();
        overrides.add_date(d(2024, 12, 25));
        let dates = build_schedule(&config, &overrides, None, dt(2024, 1, 1, 8));
        assert!(dates.contains(&d(2024, 12, 25)));
    }

    #[test]
    fn test_blank_schedule_is_added_dates_only() {
        let config = config(r#"{"name": "Whenever", "frequency": "blank"}"#);
        let mut overrides = Overrides::default();
        overrides.add_date(d(2024, 6, 1));
        overrides.add_date(d(2024, 7, 1));
        let dates = build_schedule(&config, &overrides, None, dt(2024, 1, 1, 8));
        assert_eq!(dates, vec![d(2024, 6, 1), d(2024, 7, 1)]);
    }

    #[test]
    fn test_configuration_error_leaves_schedule_empty() {
        // Daily frequency without a period cannot schedule anything.
        let config =
            config(r#"{"name": "Broken", "frequency": "every-n-days", "start_date": "2024-01-01"}"#);
        let dates = build_schedule(&config, &Overrides::default(), None, dt(2024, 1, 1, 8));
        assert!(dates.is_empty());
    }

    #[test]
    fn test_forecast_budget_bounds_output() {
        let config = config(
            r#"{"name": "Vacuum", "frequency": "every-n-days",
                "period": 1, "start_date": "2024-01-01", "forecast_dates": 2}"#,
        );
        let dates = build_schedule(&config, &Overrides::default(), None, dt(2024, 1, 1, 8));
        assert_eq!(dates.len(), 3);
    }
}
