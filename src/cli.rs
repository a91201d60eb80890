use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

// chrono's %Y-%m-%d accepts unpadded fields; the CLI only takes the
// padded forms the state file uses.
static DATE_ARG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid DATE_ARG_RE regex"));

static DATETIME_ARG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").expect("Invalid DATETIME_ARG_RE regex")
});

/// CLI arguments for chore-schedule
#[derive(Parser)]
#[command(name = "chore-schedule")]
#[command(about = "Compute due dates for recurring household chores")]
#[command(version)]
pub struct Cli {
    /// Chore configuration file (JSON)
    #[arg(long)]
    pub config: PathBuf,

    /// Chore state file (JSON); read if present, written back after the
    /// run. Without it the run starts from an empty state and persists
    /// nothing.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Evaluate as if "now" were this moment (YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = validate_datetime)]
    pub as_of: Option<String>,

    /// Timezone for resolving the current moment (IANA timezone, e.g., "Europe/Berlin")
    #[arg(long, default_value = "UTC")]
    pub tz: String,

    /// Output format: json, md, text
    #[arg(long, default_value = "json", value_parser = ["json", "md", "text"])]
    pub format: String,

    /// Output file path (stdout if not specified)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Recompute even if the state was already updated today
    #[arg(long)]
    pub force: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Recompute the schedule and show it (the default)
    Show,
    /// Mark the chore completed
    Complete {
        /// Completion moment (YYYY-MM-DDTHH:MM:SS); defaults to now
        #[arg(long, value_parser = validate_datetime)]
        at: Option<String>,
    },
    /// Force a date into the schedule
    AddDate {
        #[arg(value_parser = validate_date)]
        date: String,
    },
    /// Exclude a date from the schedule (next due date if omitted)
    RemoveDate {
        #[arg(value_parser = validate_date)]
        date: Option<String>,
    },
    /// Shift a single occurrence by a number of days (next due date if omitted)
    OffsetDate {
        /// Signed day shift, -31 to 31
        #[arg(long, allow_hyphen_values = true, value_parser = validate_offset)]
        offset: i32,
        #[arg(value_parser = validate_date)]
        date: Option<String>,
    },
}

/// Validate date format (YYYY-MM-DD)
fn validate_date(s: &str) -> Result<String, String> {
    if !DATE_ARG_RE.is_match(s) {
        return Err(format!("Invalid date '{s}': use YYYY-MM-DD format"));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| s.to_string())
        .map_err(|e| format!("Invalid date '{s}': {e}. Use YYYY-MM-DD format"))
}

/// Validate datetime format (YYYY-MM-DDTHH:MM:SS)
fn validate_datetime(s: &str) -> Result<String, String> {
    if !DATETIME_ARG_RE.is_match(s) {
        return Err(format!("Invalid datetime '{s}': use YYYY-MM-DDTHH:MM:SS format"));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|_| s.to_string())
        .map_err(|e| format!("Invalid datetime '{s}': {e}. Use YYYY-MM-DDTHH:MM:SS format"))
}

/// Validate the occurrence shift range
fn validate_offset(s: &str) -> Result<i32, String> {
    let offset: i32 = s
        .parse()
        .map_err(|e| format!("Invalid offset '{s}': {e}"))?;
    if !(-31..=31).contains(&offset) {
        return Err(format!("Offset {offset} out of range: use -31 to 31"));
    }
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2024-03-01").is_ok());
        assert!(validate_date("2024-3-1").is_err());
        assert!(validate_date("2024-03-1").is_err());
        assert!(validate_date("2024-02-30").is_err());
        assert!(validate_date("tomorrow").is_err());
    }

    #[test]
    fn test_validate_datetime() {
        assert!(validate_datetime("2024-03-01T08:30:00").is_ok());
        assert!(validate_datetime("2024-3-1T08:30:00").is_err());
        assert!(validate_datetime("2024-03-01 08:30").is_err());
    }

    #[test]
    fn test_validate_offset_range() {
        assert_eq!(validate_offset("-3"), Ok(-3));
        assert_eq!(validate_offset("31"), Ok(31));
        assert!(validate_offset("32").is_err());
        assert!(validate_offset("-32").is_err());
        assert!(validate_offset("two").is_err());
    }

    #[test]
    fn test_cli_parses_offset_command() {
        let cli = Cli::parse_from([
            "chore-schedule",
            "--config",
            "chore.json",
            "--state",
            "state.json",
            "offset-date",
            "--offset",
            "-2",
            "2024-03-01",
        ]);
        match cli.command {
            Some(Command::OffsetDate { offset, date }) => {
                assert_eq!(offset, -2);
                assert_eq!(date.as_deref(), Some("2024-03-01"));
            }
            _ => panic!("expected offset-date command"),
        }
    }

    #[test]
    fn test_cli_state_is_optional() {
        let cli = Cli::parse_from(["chore-schedule", "--config", "chore.json"]);
        assert!(cli.state.is_none());
        assert!(cli.command.is_none());
    }
}
