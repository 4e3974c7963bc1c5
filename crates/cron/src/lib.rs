//! Periodic background tasks at a fixed rate.
//!
//! Tasks are declared with a [`ScheduleSpec`] whose delay, period and unit
//! are literals or configuration keys. [`SchedulerService`] resolves them
//! when it starts, honours `<task>.enabled` and the `<task>.delay`,
//! `<task>.period` and `<task>.unit` overrides, and runs every enabled task
//! on a bounded pool until stopped.

pub mod error;
pub mod parse;
pub mod resolve;
pub mod service;
pub mod task;
pub mod types;

pub use {
    error::{Error, Result},
    resolve::resolve_schedule,
    service::SchedulerService,
    task::{Job, Task, TaskCandidate, TaskDeclaration, TaskFuture, scan_tasks},
    types::{
        ResolvedSchedule, ScheduleSpec, ScheduledJob, SchedulerState, SchedulerStatus, TaskKind,
    },
};
