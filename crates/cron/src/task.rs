use std::{any::type_name, collections::HashSet, fmt, future::Future, pin::Pin, sync::Arc};

use {
    async_trait::async_trait,
    tortuga_common::Boundary,
    tracing::{debug, info, warn},
};

use crate::{
    error::Error,
    types::{ScheduleSpec, TaskKind},
};

/// A periodic job built once and run on every tick.
///
/// Ticks may overlap when a run outlasts the period, so `run` can execute
/// concurrently with itself; implementations guard their own state.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type TaskFn = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Zero-argument unit of work behind a task.
#[derive(Clone)]
pub enum Job {
    Instance(Arc<dyn Task>),
    Function(TaskFn),
}

impl Job {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Instance(_) => TaskKind::Instance,
            Self::Function(_) => TaskKind::Function,
        }
    }

    pub fn invoke(&self) -> TaskFuture {
        match self {
            Self::Instance(task) => {
                let task = Arc::clone(task);
                Box::pin(async move { task.run().await })
            },
            Self::Function(f) => f(),
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job::{:?}", self.kind())
    }
}

/// A task accepted by [`scan_tasks`].
#[derive(Debug, Clone)]
pub struct TaskDeclaration {
    name: String,
    module: String,
    spec: ScheduleSpec,
    job: Job,
}

impl TaskDeclaration {
    /// Fully-qualified name; prefix of the task's configuration keys.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn spec(&self) -> &ScheduleSpec {
        &self.spec
    }

    pub fn kind(&self) -> TaskKind {
        self.job.kind()
    }

    pub fn job(&self) -> &Job {
        &self.job
    }
}

type InstanceBuilder = Box<dyn FnOnce() -> anyhow::Result<Arc<dyn Task>> + Send>;

enum Builder {
    Instance(InstanceBuilder),
    Function(TaskFn),
}

/// A declared task before scanning.
pub struct TaskCandidate {
    name: String,
    module: String,
    spec: ScheduleSpec,
    builder: Builder,
}

impl TaskCandidate {
    /// Instance task named after its type path.
    pub fn instance<T>(module: impl Into<String>, spec: ScheduleSpec) -> Self
    where
        T: Task + Default + 'static,
    {
        Self::instance_with(type_name::<T>(), module, spec, || Ok(T::default()))
    }

    /// Instance task built by a fallible constructor. A constructor error
    /// rejects the task at scan time.
    pub fn instance_with<T, F>(
        name: impl Into<String>,
        module: impl Into<String>,
        spec: ScheduleSpec,
        build: F,
    ) -> Self
    where
        T: Task + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            module: module.into(),
            spec,
            builder: Builder::Instance(Box::new(move || {
                build().map(|task| Arc::new(task) as Arc<dyn Task>)
            })),
        }
    }

    pub fn function<F, Fut>(
        name: impl Into<String>,
        module: impl Into<String>,
        spec: ScheduleSpec,
        f: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            module: module.into(),
            spec,
            builder: Builder::Function(Arc::new(move || Box::pin(f()) as TaskFuture)),
        }
    }

    /// Override the generated name, and with it the configuration key prefix.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn build(self) -> Result<TaskDeclaration, Error> {
        let job = match self.builder {
            Builder::Function(f) => Job::Function(f),
            Builder::Instance(build) => {
                let task = build().map_err(|e| Error::Instantiation {
                    task: self.name.clone(),
                    message: format!("{e:#}"),
                })?;
                Job::Instance(task)
            },
        };
        Ok(TaskDeclaration {
            name: self.name,
            module: self.module,
            spec: self.spec,
            job,
        })
    }
}

/// Declare an instance task in the current module.
///
/// `task!(HealthTask, "1", "1", "MINUTES")`
#[macro_export]
macro_rules! task {
    ($ty:ty, $delay:expr, $period:expr, $unit:expr $(,)?) => {
        $crate::TaskCandidate::instance::<$ty>(
            module_path!(),
            $crate::ScheduleSpec::new($delay, $period, $unit),
        )
    };
}

/// Declare an async function task in the current module, named
/// `<module>::<function>`.
#[macro_export]
macro_rules! task_fn {
    ($f:ident, $delay:expr, $period:expr, $unit:expr $(,)?) => {
        $crate::TaskCandidate::function(
            concat!(module_path!(), "::", stringify!($f)),
            module_path!(),
            $crate::ScheduleSpec::new($delay, $period, $unit),
            $f,
        )
    };
}

/// Build declarations from candidates inside `boundary`.
///
/// A candidate whose constructor fails, or whose name is already taken, is
/// logged and left out; the rest are still returned.
pub fn scan_tasks(
    candidates: impl IntoIterator<Item = TaskCandidate>,
    boundary: &Boundary,
) -> Vec<TaskDeclaration> {
    let mut seen = HashSet::new();
    let mut declarations = Vec::new();

    for candidate in candidates {
        if !boundary.contains(&candidate.module) {
            debug!(task = %candidate.name, module = %candidate.module, "task outside scan root, skipping");
            continue;
        }
        if seen.contains(&candidate.name) {
            warn!(task = %candidate.name, "duplicate task name, keeping the first declaration");
            continue;
        }
        let name = candidate.name.clone();
        match candidate.build() {
            Ok(declaration) => {
                seen.insert(name);
                declarations.push(declaration);
            },
            Err(e) => warn!(task = %name, error = %e, "rejecting task"),
        }
    }

    info!(count = declarations.len(), "registered scheduled tasks");
    declarations
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct Health;

    #[async_trait]
    impl Task for Health {
        async fn run(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    async fn check_latency() -> anyhow::Result<()> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    #[test]
    fn macros_name_tasks_by_path() {
        let instance = crate::task!(Health, "1", "1", "MINUTES");
        assert!(instance.name().ends_with("task::tests::Health"));

        let function = crate::task_fn!(check_latency, "5", "30", "SECONDS");
        assert_eq!(
            function.name(),
            concat!(module_path!(), "::check_latency")
        );
    }

    #[tokio::test]
    async fn function_job_invokes() {
        let declarations = scan_tasks(
            [crate::task_fn!(check_latency, "5", "30", "SECONDS")],
            &Boundary::unbounded(),
        );
        assert_eq!(declarations[0].kind(), TaskKind::Function);

        let before = CALLS.load(Ordering::SeqCst);
        declarations[0].job().invoke().await.unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn non_instantiable_task_is_rejected() {
        let spec = ScheduleSpec::new("1", "1", "SECONDS");
        let broken = TaskCandidate::instance_with(
            "broken",
            "app",
            spec.clone(),
            || -> anyhow::Result<Health> { anyhow::bail!("no database") },
        );
        let declarations = scan_tasks(
            [broken, TaskCandidate::instance::<Health>("app", spec)],
            &Boundary::unbounded(),
        );
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].kind(), TaskKind::Instance);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let spec = ScheduleSpec::new("1", "1", "SECONDS");
        let declarations = scan_tasks(
            [
                TaskCandidate::instance::<Health>("app", spec.clone()).named("health"),
                TaskCandidate::function("health", "app", spec, || async { Ok(()) }),
            ],
            &Boundary::unbounded(),
        );
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].kind(), TaskKind::Instance);
    }

    #[test]
    fn boundary_filters_tasks() {
        let spec = ScheduleSpec::new("1", "1", "SECONDS");
        let declarations = scan_tasks(
            [
                TaskCandidate::instance::<Health>("app::tasks", spec.clone()),
                TaskCandidate::instance::<Health>("app::other", spec).named("other"),
            ],
            &Boundary::new("app::tasks"),
        );
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].module(), "app::tasks");
    }
}
