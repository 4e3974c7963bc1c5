use std::sync::Arc;

use {
    tortuga_commands::{CommandEntry, scan_commands},
    tortuga_common::{Boundary, PlatformClient},
    tortuga_config::ConfigSource,
    tortuga_cron::{SchedulerService, TaskCandidate, scan_tasks},
    tortuga_dispatch::{Dispatcher, NotFoundHandler},
    tracing::info,
};

use crate::{
    Bot,
    error::{Error, Result},
};

/// Collects commands, tasks and the platform client for a [`Bot`].
pub struct BotBuilder {
    config: Arc<dyn ConfigSource>,
    commands: Vec<CommandEntry>,
    tasks: Vec<TaskCandidate>,
    client: Option<Arc<dyn PlatformClient>>,
    not_found: Option<Arc<dyn NotFoundHandler>>,
}

impl BotBuilder {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self {
            config,
            commands: Vec::new(),
            tasks: Vec::new(),
            client: None,
            not_found: None,
        }
    }

    #[must_use]
    pub fn command(mut self, entry: CommandEntry) -> Self {
        self.commands.push(entry);
        self
    }

    #[must_use]
    pub fn commands(mut self, entries: impl IntoIterator<Item = CommandEntry>) -> Self {
        self.commands.extend(entries);
        self
    }

    #[must_use]
    pub fn task(mut self, candidate: TaskCandidate) -> Self {
        self.tasks.push(candidate);
        self
    }

    #[must_use]
    pub fn tasks(mut self, candidates: impl IntoIterator<Item = TaskCandidate>) -> Self {
        self.tasks.extend(candidates);
        self
    }

    #[must_use]
    pub fn client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Fallback for names with no handler. Defaults to logging.
    #[must_use]
    pub fn not_found(mut self, handler: Arc<dyn NotFoundHandler>) -> Self {
        self.not_found = Some(handler);
        self
    }

    /// Scan commands and tasks inside the configured `scan.root` and wire the
    /// dispatcher and scheduler.
    pub fn build(self) -> Result<Bot> {
        let client = self.client.ok_or(Error::MissingClient)?;
        let boundary = Boundary::from_config(self.config.as_ref());
        if let Some(root) = boundary.root() {
            info!(root, "scanning declarations");
        }

        let registry = Arc::new(scan_commands(self.commands, &boundary));
        let tasks = scan_tasks(self.tasks, &boundary);

        let mut dispatcher =
            Dispatcher::new(Arc::clone(&registry), Arc::clone(&client), self.config.as_ref());
        if let Some(handler) = self.not_found {
            dispatcher = dispatcher.with_not_found(handler);
        }

        Ok(Bot {
            scheduler: SchedulerService::new(Arc::clone(&self.config)),
            config: self.config,
            client,
            dispatcher,
            tasks,
        })
    }
}
