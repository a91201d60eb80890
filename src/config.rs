use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ChoreError;

/// Recurrence class of a chore.
///
/// "every-*" frequencies follow a fixed calendar grid anchored at the start
/// date; "after-*" frequencies measure the period from the last completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    EveryNDays,
    AfterNDays,
    EveryNWeeks,
    AfterNWeeks,
    EveryNMonths,
    AfterNMonths,
    EveryNYears,
    AfterNYears,
    Blank,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::EveryNDays => "every-n-days",
            Frequency::AfterNDays => "after-n-days",
            Frequency::EveryNWeeks => "every-n-weeks",
            Frequency::AfterNWeeks => "after-n-weeks",
            Frequency::EveryNMonths => "every-n-months",
            Frequency::AfterNMonths => "after-n-months",
            Frequency::EveryNYears => "every-n-years",
            Frequency::AfterNYears => "after-n-years",
            Frequency::Blank => "blank",
        }
    }

    /// True for frequencies anchored to the last completion.
    pub fn is_after(&self) -> bool {
        matches!(
            self,
            Frequency::AfterNDays
                | Frequency::AfterNWeeks
                | Frequency::AfterNMonths
                | Frequency::AfterNYears
        )
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Frequency::Blank)
    }
}

impl FromStr for Frequency {
    type Err = ChoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "every-n-days" => Ok(Frequency::EveryNDays),
            "after-n-days" => Ok(Frequency::AfterNDays),
            "every-n-weeks" => Ok(Frequency::EveryNWeeks),
            "after-n-weeks" => Ok(Frequency::AfterNWeeks),
            "every-n-months" => Ok(Frequency::EveryNMonths),
            "after-n-months" => Ok(Frequency::AfterNMonths),
            "every-n-years" => Ok(Frequency::EveryNYears),
            "after-n-years" => Ok(Frequency::AfterNYears),
            "blank" => Ok(Frequency::Blank),
            _ => Err(ChoreError::UnknownFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = ChoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A month/day pair without a year, written as "MM/DD". Used for yearly
/// chores with a fixed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl FromStr for MonthDay {
    type Err = ChoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChoreError::MalformedOverrideToken(s.to_string());
        let (month_str, day_str) = s.split_once('/').ok_or_else(invalid)?;
        let month: u32 = month_str.parse().map_err(|_| invalid())?;
        let day: u32 = day_str.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }
        Ok(MonthDay { month, day })
    }
}

impl TryFrom<String> for MonthDay {
    type Error = ChoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MonthDay> for String {
    fn from(md: MonthDay) -> Self {
        format!("{:02}/{:02}", md.month, md.day)
    }
}

fn default_first_month() -> u32 {
    1
}

fn default_last_month() -> u32 {
    12
}

fn default_first_week() -> u32 {
    1
}

fn default_forecast_dates() -> u32 {
    10
}

/// Immutable configuration of a single chore, read from JSON. Replaced
/// wholesale on reconfiguration, never mutated field by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreConfig {
    pub name: String,
    pub frequency: Frequency,
    /// Period length; unit depends on the frequency. Required for daily
    /// frequencies, defaults to 1 elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default = "default_first_month")]
    pub first_month: u32,
    #[serde(default = "default_last_month")]
    pub last_month: u32,
    /// Weekly: which weekday the chore falls on. When unset, the start
    /// date's weekday repeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chore_day: Option<Weekday>,
    /// Accepted for compatibility with persisted weekly configs; the phase
    /// anchor is derived from the start date instead.
    #[serde(default = "default_first_week")]
    pub first_week: u32,
    /// Monthly: fixed day of the month (1-31, clipped to month length).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Monthly: ordinal of the chore day (1-5, or negative from the end).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday_order_number: Option<i32>,
    /// Monthly: interpret the ordinal as a week-of-month position instead
    /// of an occurrence count.
    #[serde(default)]
    pub force_week_numbers: bool,
    /// Monthly: signed day shift applied after the date is resolved.
    #[serde(default)]
    pub due_date_offset: i32,
    /// Yearly: fixed month/day. Defaults to the schedule start's month/day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<MonthDay>,
    /// How many candidates the schedule builder advances before giving up.
    #[serde(default = "default_forecast_dates")]
    pub forecast_dates: u32,
}

impl ChoreConfig {
    /// Parse a configuration from JSON and check its parameters.
    pub fn from_json(json: &str) -> Result<Self, ChoreError> {
        let config: ChoreConfig = serde_json::from_str(json)
            .map_err(|e| ChoreError::Configuration {
                name: "config".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the engine cannot schedule.
    pub fn validate(&self) -> Result<(), ChoreError> {
        let err = |reason: &str| Err(ChoreError::configuration(&self.name, reason));
        if self.period == Some(0) {
            return err("period must be a positive number");
        }
        if !(1..=12).contains(&self.first_month) || !(1..=12).contains(&self.last_month) {
            return err("first_month and last_month must be between 1 and 12");
        }
        if !(1..=52).contains(&self.first_week) {
            return err("first_week must be between 1 and 52");
        }
        if let Some(dom) = self.day_of_month {
            if !(1..=31).contains(&dom) {
                return err("day_of_month must be between 1 and 31");
            }
            if self.chore_day.is_some() {
                return err("day_of_month and chore_day cannot be combined");
            }
        }
        if let Some(order) = self.weekday_order_number {
            if order == 0 || order > 5 || order < -5 {
                return err("weekday_order_number must be 1-5 or -1..-5");
            }
        }
        Ok(())
    }

    /// Period with the default of 1 applied. Daily rules require an
    /// explicit period and check for its presence themselves.
    pub fn period_or_default(&self) -> u32 {
        self.period.unwrap_or(1)
    }

    /// Configured start date, falling back to Jan 1 of the year before
    /// `today` when unset.
    pub fn start_date_or_default(&self, today: NaiveDate) -> NaiveDate {
        self.start_date
            .or_else(|| NaiveDate::from_ymd_opt(today.year() - 1, 1, 1))
            .unwrap_or(today)
    }
}
