pub mod cli;
pub mod config;
pub mod date_math;
pub mod error;
pub mod logger;
pub mod overrides;
pub mod render;
pub mod rule;
pub mod schedule;
pub mod state;

pub use config::{ChoreConfig, Frequency};
pub use error::ChoreError;
pub use overrides::Overrides;
pub use schedule::build_schedule;
pub use state::{recompute, record_completion, select_next_due, ChoreState};
