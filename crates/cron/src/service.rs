//! Scheduler service: lifecycle, per-task timers and execution.

use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    futures::FutureExt,
    tokio::{
        sync::{Mutex, Notify},
        task::JoinHandle,
        time::{Instant, MissedTickBehavior, interval_at},
    },
    tokio_util::sync::CancellationToken,
    tortuga_common::{WorkerPool, error::panic_message},
    tortuga_config::{ConfigSource, keys},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use tortuga_metrics::{counter, cron as cron_metrics, gauge, histogram, labels};

use crate::{
    error::{Error, Result},
    resolve::resolve_schedule,
    task::{Job, TaskDeclaration},
    types::{ScheduledJob, SchedulerState, SchedulerStatus},
};

struct JobRuntime {
    job: ScheduledJob,
    cancel: CancellationToken,
    timer: JoinHandle<()>,
}

struct Inner {
    state: SchedulerState,
    declarations: Vec<TaskDeclaration>,
    enabled: Vec<TaskDeclaration>,
    runtimes: Vec<JobRuntime>,
}

/// Runs declared tasks at a fixed rate until stopped.
///
/// Lifecycle: `init` → `start` → `stop`, with `start` again or `restart`
/// allowed after a stop. Stopping cancels timers and drops runs still waiting
/// for a worker, but lets executions already underway finish; `status`
/// reports `ShuttingDown` until they do.
pub struct SchedulerService {
    config: Arc<dyn ConfigSource>,
    inner: Mutex<Inner>,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl SchedulerService {
    pub fn new(config: Arc<dyn ConfigSource>) -> Arc<Self> {
        Arc::new(Self {
            config,
            inner: Mutex::new(Inner {
                state: SchedulerState::Uninitialized,
                declarations: Vec::new(),
                enabled: Vec::new(),
                runtimes: Vec::new(),
            }),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        })
    }

    /// Take the declared tasks and keep those not disabled by `<task>.enabled`.
    /// Returns the number of enabled tasks.
    pub async fn init(&self, declarations: Vec<TaskDeclaration>) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        if inner.state == SchedulerState::Running {
            return Err(Error::invalid_state(inner.state, "initialize"));
        }
        inner.declarations = declarations;
        self.filter_enabled(&mut inner);
        inner.state = SchedulerState::Initialized;
        info!(
            declared = inner.declarations.len(),
            enabled = inner.enabled.len(),
            "scheduler initialized"
        );
        Ok(inner.enabled.len())
    }

    /// Resolve every enabled schedule and arm its timer. A task whose
    /// schedule cannot be resolved is logged and left out. Returns the number
    /// of tasks scheduled.
    pub async fn start(&self) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SchedulerState::Uninitialized | SchedulerState::Running => {
                return Err(Error::invalid_state(inner.state, "start"));
            },
            _ => {},
        }
        Ok(self.start_locked(&mut inner))
    }

    /// Cancel every timer along with its queued runs. Returns the number
    /// cancelled, zero when the scheduler was not running.
    pub async fn stop(&self) -> usize {
        let mut inner = self.inner.lock().await;
        Self::stop_locked(&mut inner).await
    }

    /// Stop, re-read which tasks are enabled and start again with freshly
    /// resolved schedules.
    pub async fn restart(&self) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        if inner.state == SchedulerState::Uninitialized {
            return Err(Error::invalid_state(inner.state, "restart"));
        }
        let cancelled = Self::stop_locked(&mut inner).await;
        self.filter_enabled(&mut inner);
        let scheduled = self.start_locked(&mut inner);
        info!(cancelled, scheduled, "scheduler restarted");
        Ok(scheduled)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let inner = self.inner.lock().await;
        let in_flight = self.in_flight();
        let state = match inner.state {
            SchedulerState::Stopped if in_flight > 0 => SchedulerState::ShuttingDown,
            state => state,
        };
        SchedulerStatus {
            state,
            declared: inner.declarations.len(),
            enabled: inner.enabled.len(),
            scheduled: inner.runtimes.len(),
            in_flight,
        }
    }

    /// Tasks with a live timer, in declaration order.
    pub async fn scheduled(&self) -> Vec<ScheduledJob> {
        let inner = self.inner.lock().await;
        inner.runtimes.iter().map(|rt| rt.job.clone()).collect()
    }

    /// Executions currently queued or running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no execution is queued or running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn filter_enabled(&self, inner: &mut Inner) {
        inner.enabled = inner
            .declarations
            .iter()
            .filter(|decl| {
                let enabled = self
                    .config
                    .get_bool_or(&keys::task_enabled(decl.name()), true);
                if !enabled {
                    info!(task = %decl.name(), "task disabled by configuration");
                }
                enabled
            })
            .cloned()
            .collect();
    }

    fn start_locked(&self, inner: &mut Inner) -> usize {
        let pool = WorkerPool::new(inner.enabled.len());
        let mut runtimes = Vec::with_capacity(inner.enabled.len());

        for decl in &inner.enabled {
            let schedule = match resolve_schedule(decl.name(), decl.spec(), self.config.as_ref()) {
                Ok(schedule) => schedule,
                Err(e) => {
                    error!(task = %decl.name(), error = %e, "not scheduling task");
                    continue;
                },
            };
            let job = ScheduledJob {
                name: decl.name().to_string(),
                kind: decl.kind(),
                schedule,
            };
            let cancel = CancellationToken::new();
            let timer = tokio::spawn(run_timer(
                job.clone(),
                decl.job().clone(),
                pool.clone(),
                cancel.clone(),
                Arc::clone(&self.in_flight),
                Arc::clone(&self.idle),
            ));
            info!(task = %job.name, schedule = %job.schedule, "task scheduled");
            runtimes.push(JobRuntime { job, cancel, timer });
        }

        #[cfg(feature = "metrics")]
        gauge!(cron_metrics::JOBS_SCHEDULED).set(runtimes.len() as f64);

        let scheduled = runtimes.len();
        inner.runtimes = runtimes;
        inner.state = SchedulerState::Running;
        info!(scheduled, workers = pool.size(), "scheduler started");
        scheduled
    }

    async fn stop_locked(inner: &mut Inner) -> usize {
        if inner.state != SchedulerState::Running {
            debug!(state = %inner.state, "scheduler not running, nothing to stop");
            return 0;
        }
        let runtimes = std::mem::take(&mut inner.runtimes);
        let cancelled = runtimes.len();
        for rt in &runtimes {
            rt.cancel.cancel();
        }
        for rt in runtimes {
            if let Err(e) = rt.timer.await {
                warn!(task = %rt.job.name, error = %e, "timer did not shut down cleanly");
            }
        }
        inner.state = SchedulerState::Stopped;

        #[cfg(feature = "metrics")]
        gauge!(cron_metrics::JOBS_SCHEDULED).set(0.0);

        info!(cancelled, "scheduler stopped");
        cancelled
    }
}

async fn run_timer(
    scheduled: ScheduledJob,
    job: Job,
    pool: WorkerPool,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
) {
    let Some(start) = Instant::now().checked_add(scheduled.schedule.initial_delay_duration()) else {
        error!(task = %scheduled.name, schedule = %scheduled.schedule, "initial delay out of range");
        return;
    };
    let mut ticker = interval_at(start, scheduled.schedule.period_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let name: Arc<str> = Arc::from(scheduled.name.as_str());

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let guard = InFlight::enter(Arc::clone(&in_flight), Arc::clone(&idle));
                pool.spawn_cancellable(execute(Arc::clone(&name), job.clone(), guard), cancel.clone());
            },
        }
    }
    debug!(task = %name, "timer cancelled");
}

async fn execute(name: Arc<str>, job: Job, _guard: InFlight) {
    debug!(task = %name, "running task");

    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();
    #[cfg(feature = "metrics")]
    counter!(cron_metrics::EXECUTIONS_TOTAL, labels::TASK => name.to_string()).increment(1);

    let outcome = AssertUnwindSafe(async { job.invoke().await })
        .catch_unwind()
        .await;

    #[cfg(feature = "metrics")]
    histogram!(cron_metrics::EXECUTION_DURATION_SECONDS, labels::TASK => name.to_string())
        .record(started.elapsed().as_secs_f64());

    match outcome {
        Ok(Ok(())) => return,
        Ok(Err(e)) => error!(task = %name, error = %format!("{e:#}"), "error invoking task"),
        Err(payload) => {
            error!(task = %name, panic = %panic_message(payload.as_ref()), "task panicked");
        },
    }

    #[cfg(feature = "metrics")]
    counter!(cron_metrics::ERRORS_TOTAL, labels::TASK => name.to_string()).increment(1);
}

/// Counts an execution from the tick that queued it until it returns or is
/// dropped unrun.
struct InFlight {
    count: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl InFlight {
    fn enter(count: Arc<AtomicUsize>, idle: Arc<Notify>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        #[cfg(feature = "metrics")]
        gauge!(cron_metrics::IN_FLIGHT).set(count.load(Ordering::SeqCst) as f64);
        Self { count, idle }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let before = self.count.fetch_sub(1, Ordering::SeqCst);
        #[cfg(feature = "metrics")]
        gauge!(cron_metrics::IN_FLIGHT).set((before - 1) as f64);
        if before == 1 {
            self.idle.notify_waiters();
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            task::{TaskCandidate, scan_tasks},
            types::{ResolvedSchedule, ScheduleSpec},
        },
        std::time::Duration,
        tortuga_common::Boundary,
        tortuga_config::{Settings, TimeUnit},
    };

    fn counting(name: &str, spec: ScheduleSpec, count: &Arc<AtomicUsize>) -> TaskCandidate {
        let count = Arc::clone(count);
        TaskCandidate::function(name, "app::tasks", spec, move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn declarations(candidates: impl IntoIterator<Item = TaskCandidate>) -> Vec<TaskDeclaration> {
        scan_tasks(candidates, &Boundary::unbounded())
    }

    fn service(config: &Arc<Settings>) -> Arc<SchedulerService> {
        SchedulerService::new(Arc::clone(config) as Arc<dyn ConfigSource>)
    }

    #[tokio::test(start_paused = true)]
    async fn literal_schedule_runs_at_fixed_rate() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let count = Arc::new(AtomicUsize::new(0));
        svc.init(declarations([counting(
            "latency",
            ScheduleSpec::new("5", "30", "SECONDS"),
            &count,
        )]))
        .await
        .unwrap();
        assert_eq!(svc.start().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        let scheduled = svc.scheduled().await;
        assert_eq!(scheduled[0].schedule, ResolvedSchedule {
            initial_delay: 5,
            period: 30,
            unit: TimeUnit::Seconds,
        });
        assert_eq!(svc.stop().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolvable_task_is_isolated() {
        let config = Arc::new(Settings::from_pairs([
            ("scheduler.otherStuff.delay", "0"),
            ("scheduler.otherStuff.period", "1"),
            ("scheduler.otherStuff.unit", "MINUTES"),
        ]));
        let svc = service(&config);
        let good = Arc::new(AtomicUsize::new(0));
        let bad = Arc::new(AtomicUsize::new(0));
        svc.init(declarations([
            counting(
                "other_stuff",
                ScheduleSpec::new(
                    "scheduler.otherStuff.delay",
                    "scheduler.otherStuff.period",
                    "scheduler.otherStuff.unit",
                ),
                &good,
            ),
            counting(
                "broken",
                ScheduleSpec::new("0", "scheduler.missing.period", "SECONDS"),
                &bad,
            ),
        ]))
        .await
        .unwrap();

        assert_eq!(svc.start().await.unwrap(), 1);
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(good.load(Ordering::SeqCst), 2);
        assert_eq!(bad.load(Ordering::SeqCst), 0);
        let status = svc.status().await;
        assert_eq!(status.enabled, 2);
        assert_eq!(status.scheduled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_task_is_not_scheduled() {
        let config = Arc::new(Settings::from_pairs([("quiet.enabled", "false")]));
        let svc = service(&config);
        let count = Arc::new(AtomicUsize::new(0));
        let spec = ScheduleSpec::new("0", "1", "SECONDS");
        let enabled = svc
            .init(declarations([
                counting("loud", spec.clone(), &count),
                counting("quiet", spec, &count),
            ]))
            .await
            .unwrap();

        assert_eq!(enabled, 1);
        svc.start().await.unwrap();
        let names: Vec<_> = svc.scheduled().await.into_iter().map(|j| j.name).collect();
        assert_eq!(names, vec!["loud".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_twice_is_harmless() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let count = Arc::new(AtomicUsize::new(0));
        svc.init(declarations([counting(
            "tick",
            ScheduleSpec::new("0", "1", "SECONDS"),
            &count,
        )]))
        .await
        .unwrap();
        svc.start().await.unwrap();

        assert_eq!(svc.stop().await, 1);
        assert_eq!(svc.stop().await, 0);

        let before = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
        assert_eq!(svc.status().await.state, SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn lifecycle_errors() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);

        assert!(matches!(
            svc.start().await,
            Err(Error::InvalidState {
                state: SchedulerState::Uninitialized,
                ..
            })
        ));
        assert!(svc.restart().await.is_err());

        svc.init(Vec::new()).await.unwrap();
        assert_eq!(svc.start().await.unwrap(), 0);
        assert!(matches!(
            svc.start().await,
            Err(Error::InvalidState {
                state: SchedulerState::Running,
                ..
            })
        ));
        assert!(svc.init(Vec::new()).await.is_err());

        svc.stop().await;
        assert_eq!(svc.start().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_future_runs() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let errors = Arc::new(AtomicUsize::new(0));
        let panics = Arc::new(AtomicUsize::new(0));
        let spec = ScheduleSpec::new("0", "1", "SECONDS");

        let e = Arc::clone(&errors);
        let failing = TaskCandidate::function("failing", "app", spec.clone(), move || {
            let e = Arc::clone(&e);
            async move {
                e.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("upstream unavailable")
            }
        });
        let p = Arc::clone(&panics);
        let panicking = TaskCandidate::function("panicking", "app", spec, move || {
            let p = Arc::clone(&p);
            async move {
                if p.fetch_add(1, Ordering::SeqCst) < usize::MAX {
                    panic!("boom");
                }
                Ok(())
            }
        });

        svc.init(declarations([failing, panicking])).await.unwrap();
        svc.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(errors.load(Ordering::SeqCst), 4);
        assert_eq!(panics.load(Ordering::SeqCst), 4);
        svc.wait_idle().await;
        assert_eq!(svc.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_reads_fresh_configuration() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let count = Arc::new(AtomicUsize::new(0));
        let spec = ScheduleSpec::new("0", "30", "SECONDS");
        svc.init(declarations([
            counting("fast", spec.clone(), &count),
            counting("optional", spec, &count),
        ]))
        .await
        .unwrap();
        assert_eq!(svc.start().await.unwrap(), 2);

        config.set("fast.period", "5");
        config.set("optional.enabled", "false");
        assert_eq!(svc.restart().await.unwrap(), 1);

        let scheduled = svc.scheduled().await;
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].name, "fast");
        assert_eq!(scheduled[0].schedule.period, 5);
        assert_eq!(svc.status().await.state, SchedulerState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_reports_shutting_down_until_idle() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let slow = TaskCandidate::function(
            "slow",
            "app",
            ScheduleSpec::new("0", "1", "HOURS"),
            || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
        );
        svc.init(declarations([slow])).await.unwrap();
        svc.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        svc.stop().await;
        let status = svc.status().await;
        assert!(status.is_shutting_down());
        assert_eq!(status.in_flight, 1);

        svc.wait_idle().await;
        assert_eq!(svc.status().await.state, SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_drops_runs_waiting_for_a_worker() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let started = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&started);
        let slow = TaskCandidate::function(
            "slow",
            "app",
            ScheduleSpec::new("0", "1", "SECONDS"),
            move || {
                let s = Arc::clone(&s);
                async move {
                    s.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok(())
                }
            },
        );
        svc.init(declarations([slow])).await.unwrap();
        svc.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(svc.in_flight(), 6);

        svc.stop().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(svc.in_flight(), 1);
        assert!(svc.status().await.is_shutting_down());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(svc.in_flight(), 0);
        assert_eq!(svc.status().await.state, SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_drops_runs_queued_under_old_schedule() {
        let config = Arc::new(Settings::new());
        let svc = service(&config);
        let started = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&started);
        let slow = TaskCandidate::function(
            "slow",
            "app",
            ScheduleSpec::new("0", "1", "SECONDS"),
            move || {
                let s = Arc::clone(&s);
                async move {
                    s.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok(())
                }
            },
        );
        svc.init(declarations([slow])).await.unwrap();
        svc.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        config.set("slow.delay", "1");
        config.set("slow.period", "1");
        config.set("slow.unit", "HOURS");
        assert_eq!(svc.restart().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(svc.in_flight(), 0);
    }
}
