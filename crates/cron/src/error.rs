use thiserror::Error;

use crate::types::SchedulerState;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resolve {field} '{spec}' for task {task}: not a literal and not a configured key")]
    ScheduleResolution {
        task: String,
        field: &'static str,
        spec: String,
    },

    #[error("period of task {task} must be greater than zero")]
    ZeroPeriod { task: String },

    #[error("{field} of task {task} is too large to schedule")]
    OutOfRange { task: String, field: &'static str },

    #[error("cannot {operation} scheduler while {state}")]
    InvalidState {
        state: SchedulerState,
        operation: &'static str,
    },

    #[error("task {task} cannot be instantiated: {message}")]
    Instantiation { task: String, message: String },

    #[error(transparent)]
    Config(#[from] tortuga_config::Error),
}

impl Error {
    #[must_use]
    pub fn unresolved(task: impl Into<String>, field: &'static str, spec: impl Into<String>) -> Self {
        Self::ScheduleResolution {
            task: task.into(),
            field,
            spec: spec.into(),
        }
    }

    #[must_use]
    pub fn invalid_state(state: SchedulerState, operation: &'static str) -> Self {
        Self::InvalidState { state, operation }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
