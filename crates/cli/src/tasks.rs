//! Sample periodic tasks.

use std::time::Instant;

use {
    async_trait::async_trait,
    tortuga_cron::{Task, TaskCandidate, task, task_fn},
    tracing::info,
};

pub fn candidates() -> Vec<TaskCandidate> {
    vec![
        task!(HealthTask, "1", "1", "MINUTES"),
        task_fn!(check_latency, "5", "30", "SECONDS"),
        task_fn!(
            check_other_stuff,
            "scheduler.otherStuff.delay",
            "scheduler.otherStuff.period",
            "scheduler.otherStuff.unit",
        ),
    ]
}

/// Logs how long the host has been up.
pub struct HealthTask {
    started: Instant,
}

impl Default for HealthTask {
    fn default() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

#[async_trait]
impl Task for HealthTask {
    async fn run(&self) -> anyhow::Result<()> {
        info!(uptime_secs = self.started.elapsed().as_secs(), "healthy");
        Ok(())
    }
}

async fn check_latency() -> anyhow::Result<()> {
    let started = Instant::now();
    tokio::task::yield_now().await;
    info!(latency_us = started.elapsed().as_micros() as u64, "scheduler latency");
    Ok(())
}

async fn check_other_stuff() -> anyhow::Result<()> {
    info!("checking other stuff");
    Ok(())
}
