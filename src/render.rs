use serde::Serialize;

use crate::config::ChoreConfig;
use crate::state::ChoreState;

/// What one run reports: the chore's identity plus its recomputed state.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub name: &'a str,
    pub frequency: String,
    #[serde(flatten)]
    pub state: &'a ChoreState,
}

impl<'a> Report<'a> {
    pub fn new(config: &'a ChoreConfig, state: &'a ChoreState) -> Self {
        Report {
            name: &config.name,
            frequency: config.frequency.to_string(),
            state,
        }
    }
}

/// Render a report as Markdown
pub fn render_markdown(report: &Report<'_>) -> String {
    let mut output = format!("# {}\n\n", report.name);
    output.push_str(&format!("**Frequency:** {}\n", report.frequency));

    match report.state.next_due_date {
        Some(due) => {
            output.push_str(&format!("**Next due:** {due}"));
            if let Some(days) = report.state.days {
                output.push_str(&days_label(days));
            }
            output.push('\n');
        }
        None => output.push_str("**Next due:** none scheduled\n"),
    }
    if let Some(completed) = report.state.last_completed {
        output.push_str(&format!("**Last completed:** {completed}\n"));
    }

    if !report.state.due_dates.is_empty() {
        output.push_str("\n## Upcoming\n\n");
        for date in &report.state.due_dates {
            output.push_str(&format!("- {date}\n"));
        }
    }
    output
}

/// Render a report as plain text
pub fn render_text(report: &Report<'_>) -> String {
    let mut output = format!("{} ({})\n", report.name, report.frequency);

    match report.state.next_due_date {
        Some(due) => {
            output.push_str(&format!("next due: {due}"));
            if let Some(days) = report.state.days {
                output.push_str(&days_label(days));
            }
            output.push('\n');
        }
        None => output.push_str("next due: none scheduled\n"),
    }
    for date in &report.state.due_dates {
        output.push_str(&format!("  {date}\n"));
    }
    output
}

fn days_label(days: i64) -> String {
    match days {
        0 => " (today)".to_string(),
        1 => " (tomorrow)".to_string(),
        d if d > 1 => format!(" (in {d} days)"),
        -1 => " (1 day overdue)".to_string(),
        d => format!(" ({} days overdue)", -d),
    }
}
