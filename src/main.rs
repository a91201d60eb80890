use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::Parser;
use std::fs;
use std::io::{self, Write};

use chore_schedule::cli::{Cli, Command};
use chore_schedule::logger::Logger;
use chore_schedule::render::{render_markdown, render_text, Report};
use chore_schedule::state::{
    add_override_date, needs_update, offset_override_date, record_completion,
    remove_override_date, recompute,
};
use chore_schedule::{ChoreConfig, ChoreState};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if Logger::init().is_ok() {
        log::set_max_level(log::LevelFilter::Warn);
    }
    let cli = Cli::parse();

    let config = ChoreConfig::from_json(&fs::read_to_string(&cli.config)?)?;
    let state: ChoreState = match &cli.state {
        Some(path) if path.exists() => serde_json::from_str(&fs::read_to_string(path)?)?,
        _ => ChoreState::default(),
    };

    // The wall clock is read once; everything downstream sees this moment.
    let as_of = match &cli.as_of {
        Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")?,
        None => {
            let tz: Tz = cli.tz.parse().map_err(|e| format!("Invalid timezone: {e}"))?;
            Utc::now().with_timezone(&tz).naive_local()
        }
    };

    let next = match &cli.command {
        None | Some(Command::Show) => {
            if cli.force || needs_update(&state, as_of) {
                recompute(&config, &state, as_of)
            } else {
                log::debug!("({}) already updated today", config.name);
                state
            }
        }
        Some(Command::Complete { at }) => {
            let completed_at = match at {
                Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")?,
                None => as_of,
            };
            record_completion(&config, &state, completed_at, as_of)
        }
        Some(Command::AddDate { date }) => {
            add_override_date(&config, &state, date.parse()?, as_of)
        }
        Some(Command::RemoveDate { date }) => {
            let date = date.as_deref().map(str::parse).transpose()?;
            remove_override_date(&config, &state, date, as_of)
        }
        Some(Command::OffsetDate { offset, date }) => {
            let date = date.as_deref().map(str::parse).transpose()?;
            offset_override_date(&config, &state, date, *offset, as_of)
        }
    };

    if let Some(path) = &cli.state {
        fs::write(path, serde_json::to_string_pretty(&next)?)?;
    }

    let report = Report::new(&config, &next);
    let output = match cli.format.as_str() {
        "json" => serde_json::to_string_pretty(&report)?,
        "md" => render_markdown(&report),
        "text" => render_text(&report),
        _ => return Err("Invalid format".into()),
    };

    if let Some(out_path) = cli.output {
        fs::write(out_path, output)?;
    } else {
        io::stdout().write_all(output.as_bytes())?;
    }

    Ok(())
}
