//! Metric name and label definitions.

/// Command dispatch metrics
pub mod dispatch {
    /// Events accepted for routing (labels: kind)
    pub const EVENTS_TOTAL: &str = "tortuga_dispatch_events_total";
    /// Text events dropped by validation (labels: reason)
    pub const IGNORED_TOTAL: &str = "tortuga_dispatch_ignored_total";
    /// Events whose name had no handler (labels: kind)
    pub const NOT_FOUND_TOTAL: &str = "tortuga_dispatch_not_found_total";
    /// Handler failures (labels: kind, severity)
    pub const FAILURES_TOTAL: &str = "tortuga_dispatch_failures_total";
    /// Time from instantiation to handler return
    pub const HANDLER_DURATION_SECONDS: &str = "tortuga_dispatch_handler_duration_seconds";
}

/// Periodic task metrics
pub mod cron {
    /// Number of scheduled jobs
    pub const JOBS_SCHEDULED: &str = "tortuga_cron_jobs_scheduled";
    /// Total job executions (labels: task)
    pub const EXECUTIONS_TOTAL: &str = "tortuga_cron_executions_total";
    /// Failed or panicked executions (labels: task)
    pub const ERRORS_TOTAL: &str = "tortuga_cron_errors_total";
    /// Job execution duration in seconds
    pub const EXECUTION_DURATION_SECONDS: &str = "tortuga_cron_execution_duration_seconds";
    /// Executions still running
    pub const IN_FLIGHT: &str = "tortuga_cron_in_flight";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const COMMAND: &str = "command";
    pub const REASON: &str = "reason";
    pub const SEVERITY: &str = "severity";
    pub const TASK: &str = "task";
}
