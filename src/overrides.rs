use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ChoreError;

// Date token pattern: 2024-03-01. chrono's %Y-%m-%d accepts unpadded
// fields, so the wire format is enforced before parsing.
static DATE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid DATE_TOKEN_RE regex"));

// Offset token pattern: 2024-03-01:-2
static OFFSET_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}):([+-]?\d+)$").expect("Invalid OFFSET_TOKEN_RE regex")
});

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Manual adjustments layered over a rule-derived schedule.
///
/// Internally these are typed sets keyed by date; the space-separated token
/// strings the host persists (`YYYY-MM-DD` and `YYYY-MM-DD:N`) only exist
/// at the serialization boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOverrides", into = "RawOverrides")]
pub struct Overrides {
    /// Dates always included, bypassing rule and month-range checks.
    pub add: BTreeSet<NaiveDate>,
    /// Dates excluded even when the rule matches them. Removal wins over
    /// `add` for a date present in both.
    pub remove: BTreeSet<NaiveDate>,
    /// Per-date signed day shifts applied to single occurrences.
    pub offsets: BTreeMap<NaiveDate, i32>,
}

impl Overrides {
    /// Record a date to always include. Returns false when it was already
    /// present.
    pub fn add_date(&mut self, date: NaiveDate) -> bool {
        self.add.insert(date)
    }

    /// Record a date to exclude. Returns false when it was already present.
    pub fn remove_date(&mut self, date: NaiveDate) -> bool {
        self.remove.insert(date)
    }

    /// Shift a single occurrence by `offset` days, replacing any earlier
    /// shift recorded for the same date.
    pub fn offset_date(&mut self, date: NaiveDate, offset: i32) {
        self.offsets.insert(date, offset);
    }

    /// Drop overrides dated strictly before `window_start`; they can no
    /// longer affect the schedule.
    pub fn prune_before(&mut self, window_start: NaiveDate) {
        self.add.retain(|d| *d >= window_start);
        self.remove.retain(|d| *d >= window_start);
        self.offsets.retain(|d, _| *d >= window_start);
    }
}

/// Parse a single `YYYY-MM-DD` token. Unpadded fields are rejected.
pub fn parse_date_token(token: &str) -> Result<NaiveDate, ChoreError> {
    if !DATE_TOKEN_RE.is_match(token) {
        return Err(ChoreError::MalformedOverrideToken(token.to_string()));
    }
    NaiveDate::parse_from_str(token, DATE_FORMAT)
        .map_err(|_| ChoreError::MalformedOverrideToken(token.to_string()))
}

/// Parse a single `YYYY-MM-DD:N` token into a date and signed day offset.
pub fn parse_offset_token(token: &str) -> Result<(NaiveDate, i32), ChoreError> {
    let invalid = || ChoreError::MalformedOverrideToken(token.to_string());
    let caps = OFFSET_TOKEN_RE.captures(token).ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(&caps[1], DATE_FORMAT).map_err(|_| invalid())?;
    let offset: i32 = caps[2].parse().map_err(|_| invalid())?;
    Ok((date, offset))
}

fn parse_date_list(tokens: &str) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    for token in tokens.split_whitespace() {
        match parse_date_token(token) {
            Ok(date) => {
                dates.insert(date);
            }
            Err(err) => log::warn!("dropping override token: {err}"),
        }
    }
    dates
}

fn parse_offset_list(tokens: &str) -> BTreeMap<NaiveDate, i32> {
    let mut offsets = BTreeMap::new();
    for token in tokens.split_whitespace() {
        match parse_offset_token(token) {
            Ok((date, offset)) => {
                offsets.insert(date, offset);
            }
            Err(err) => log::warn!("dropping override token: {err}"),
        }
    }
    offsets
}

fn join_dates(dates: &BTreeSet<NaiveDate>) -> Option<String> {
    if dates.is_empty() {
        return None;
    }
    Some(
        dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn join_offsets(offsets: &BTreeMap<NaiveDate, i32>) -> Option<String> {
    if offsets.is_empty() {
        return None;
    }
    Some(
        offsets
            .iter()
            .map(|(d, o)| format!("{}:{}", d.format(DATE_FORMAT), o))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Wire form of the override lists, matching the host's persisted-state
/// attribute format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    add_dates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove_dates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset_dates: Option<String>,
}

impl From<RawOverrides> for Overrides {
    fn from(raw: RawOverrides) -> Self {
        Overrides {
            add: raw.add_dates.as_deref().map(parse_date_list).unwrap_or_default(),
            remove: raw
                .remove_dates
                .as_deref()
                .map(parse_date_list)
                .unwrap_or_default(),
            offsets: raw
                .offset_dates
                .as_deref()
                .map(parse_offset_list)
                .unwrap_or_default(),
        }
    }
}

impl From<Overrides> for RawOverrides {
    fn from(overrides: Overrides) -> Self {
        RawOverrides {
            add_dates: join_dates(&overrides.add),
            remove_dates: join_dates(&overrides.remove),
            offset_dates: join_offsets(&overrides.offsets),
        }
    }
}
