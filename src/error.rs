use thiserror::Error;

/// Errors surfaced by the scheduling engine.
///
/// Only genuinely broken input is an error here. An empty schedule or a
/// missing next due date is a normal outcome and is represented as `None`
/// by the functions that compute them.
#[derive(Debug, Error)]
pub enum ChoreError {
    /// The selected frequency needs a parameter that was not configured,
    /// e.g. a daily chore without `period` or `start_date`. Fatal to this
    /// chore's schedule, not to the process.
    #[error("({name}) invalid configuration: {reason}")]
    Configuration { name: String, reason: String },

    /// The configuration names a frequency outside the supported set.
    /// Reported at construction time, before any date arithmetic.
    #[error("unknown chore frequency '{0}'")]
    UnknownFrequency(String),

    /// A persisted override token failed to parse as `YYYY-MM-DD` or
    /// `YYYY-MM-DD:N`. Callers drop the token with a warning instead of
    /// aborting the whole override list.
    #[error("malformed override token '{0}'")]
    MalformedOverrideToken(String),
}

impl ChoreError {
    pub fn configuration(name: &str, reason: impl Into<String>) -> Self {
        ChoreError::Configuration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
