use std::{fmt, time::Duration};

use {serde::Serialize, tortuga_config::TimeUnit};

/// Declared schedule. Each field is a literal (`"30"`, `"SECONDS"`) or the
/// name of a configuration key holding one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    pub initial_delay: String,
    pub period: String,
    pub unit: String,
}

impl ScheduleSpec {
    pub fn new(
        initial_delay: impl Into<String>,
        period: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            initial_delay: initial_delay.into(),
            period: period.into(),
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// A [`Task`](crate::Task) value built once at scan time.
    Instance,
    /// A free async function.
    Function,
}

/// Effective schedule after overrides and config lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSchedule {
    pub initial_delay: u64,
    pub period: u64,
    pub unit: TimeUnit,
}

impl ResolvedSchedule {
    pub fn initial_delay_duration(&self) -> Duration {
        self.unit.duration(self.initial_delay)
    }

    pub fn period_duration(&self) -> Duration {
        self.unit.duration(self.period)
    }
}

impl fmt::Display for ResolvedSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "every {} {} after {}",
            self.period, self.unit, self.initial_delay
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
    /// Stopped, with executions still finishing. Only reported by `status`.
    ShuttingDown,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::ShuttingDown => "shutting down",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    /// Tasks handed to `init`.
    pub declared: usize,
    /// Tasks left after `<task>.enabled` filtering.
    pub enabled: usize,
    /// Tasks with a live timer.
    pub scheduled: usize,
    pub in_flight: usize,
}

impl SchedulerStatus {
    pub fn is_shutting_down(&self) -> bool {
        self.state == SchedulerState::ShuttingDown
    }
}

/// A task with a live timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJob {
    pub name: String,
    pub kind: TaskKind,
    pub schedule: ResolvedSchedule,
}
