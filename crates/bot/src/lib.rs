//! One value owning everything a tortuga bot runs: the handler registry, the
//! text and slash dispatchers, and the periodic task scheduler.
//!
//! The host builds a [`Bot`] with [`BotBuilder`], forwards platform events to
//! [`Bot::on_message`] and [`Bot::on_slash_command`], and drives the
//! scheduler through [`Bot::start`] and [`Bot::shutdown`].

pub mod builder;
pub mod error;

use std::sync::Arc;

use {
    tokio::task::JoinHandle,
    tortuga_commands::{HandlerRegistry, slash_commands},
    tortuga_common::{PlatformClient, SlashEvent, TextEvent, command::SlashCommandSpec},
    tortuga_config::{ConfigSource, keys},
    tortuga_cron::{SchedulerService, SchedulerState, SchedulerStatus, TaskDeclaration},
    tortuga_dispatch::{Dispatch, DispatchReport, Dispatcher},
    tracing::info,
};

pub use {
    builder::BotBuilder,
    error::{Error, Result},
};

pub struct Bot {
    config: Arc<dyn ConfigSource>,
    client: Arc<dyn PlatformClient>,
    dispatcher: Dispatcher,
    scheduler: Arc<SchedulerService>,
    tasks: Vec<TaskDeclaration>,
}

impl Bot {
    pub fn builder(config: Arc<dyn ConfigSource>) -> BotBuilder {
        BotBuilder::new(config)
    }

    /// Publish slash commands when `command.update` is set, then start the
    /// scheduler.
    pub async fn start(&self) -> Result<usize> {
        if self.config.get_bool_or(keys::COMMAND_UPDATE, false) {
            self.update_slash_commands().await?;
        }
        self.start_tasks().await
    }

    /// Publishing payload for every registered slash command.
    pub fn slash_commands(&self) -> Vec<SlashCommandSpec> {
        slash_commands(self.registry())
    }

    /// Replace the platform's global command list with the registered slash
    /// commands. Returns the names the platform accepted.
    pub async fn update_slash_commands(&self) -> Result<Vec<String>> {
        let specs = self.slash_commands();
        let names = self
            .client
            .overwrite_commands(&specs)
            .await
            .map_err(|e| Error::platform("overwriting application commands", e))?;
        info!(commands = ?names, "overwrote global application commands");
        Ok(names)
    }

    pub fn on_message(&self, event: TextEvent) -> Dispatch {
        self.dispatcher.on_message(event)
    }

    pub fn on_slash_command(&self, event: SlashEvent) -> JoinHandle<DispatchReport> {
        self.dispatcher.on_slash_command(event)
    }

    /// Initialize the scheduler on first use, then start it.
    pub async fn start_tasks(&self) -> Result<usize> {
        if self.scheduler.status().await.state == SchedulerState::Uninitialized {
            self.scheduler.init(self.tasks.clone()).await?;
        }
        Ok(self.scheduler.start().await?)
    }

    pub async fn stop_tasks(&self) -> usize {
        self.scheduler.stop().await
    }

    /// Reload configuration and restart the scheduler so changed
    /// `<task>.*` keys take effect.
    pub async fn restart_tasks(&self) -> Result<usize> {
        self.config.reload()?;
        Ok(self.scheduler.restart().await?)
    }

    pub async fn task_status(&self) -> SchedulerStatus {
        self.scheduler.status().await
    }

    /// Stop the scheduler and wait for running tasks to finish.
    pub async fn shutdown(&self) {
        let cancelled = self.scheduler.stop().await;
        self.scheduler.wait_idle().await;
        info!(cancelled, "bot shut down");
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &Arc<SchedulerService> {
        &self.scheduler
    }

    pub fn tasks(&self) -> &[TaskDeclaration] {
        &self.tasks
    }

    pub fn config(&self) -> &Arc<dyn ConfigSource> {
        &self.config
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        std::{
            sync::{
                Mutex,
                atomic::{AtomicUsize, Ordering},
            },
            time::Duration,
        },
        tortuga_commands::{CommandEntry, SlashContext, SlashHandler},
        tortuga_common::{
            BotError, Response,
            types::{InteractionRef, MessageRef},
        },
        tortuga_config::Settings,
        tortuga_cron::{ScheduleSpec, TaskCandidate},
    };

    #[derive(Default)]
    struct Publisher {
        published: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl PlatformClient for Publisher {
        async fn reply(&self, _message: &MessageRef, _response: Response) -> anyhow::Result<()> {
            Ok(())
        }

        async fn respond(&self, _interaction: &InteractionRef, _response: Response) -> anyhow::Result<()> {
            Ok(())
        }

        async fn overwrite_commands(&self, commands: &[SlashCommandSpec]) -> anyhow::Result<Vec<String>> {
            let names: Vec<_> = commands.iter().map(|c| c.name.clone()).collect();
            self.published.lock().unwrap().push(names.clone());
            Ok(names)
        }
    }

    #[derive(Default)]
    struct Ping;

    #[async_trait]
    impl SlashHandler for Ping {
        async fn handle(self: Box<Self>, ctx: SlashContext) -> std::result::Result<(), BotError> {
            ctx.respond(Response::embed(ctx.success("Pong!"))).await
        }
    }

    fn counting_task(name: &str, module: &str, count: &Arc<AtomicUsize>) -> TaskCandidate {
        let count = Arc::clone(count);
        TaskCandidate::function(name, module, ScheduleSpec::new("0", "10", "SECONDS"), move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn bot(config: Settings, client: Arc<Publisher>, count: &Arc<AtomicUsize>) -> Bot {
        Bot::builder(Arc::new(config))
            .command(CommandEntry::new("app::commands", "ping", "Pong!").slash::<Ping>())
            .command(CommandEntry::new("vendor::commands", "stray", "Out of scope").slash::<Ping>())
            .task(counting_task("app::tasks::heartbeat", "app::tasks", count))
            .task(counting_task("vendor::tasks::stray", "vendor::tasks", count))
            .client(client)
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_a_client() {
        let result = Bot::builder(Arc::new(Settings::new())).build();
        assert!(matches!(result, Err(Error::MissingClient)));
    }

    #[tokio::test]
    async fn scan_root_bounds_commands_and_tasks() {
        let count = Arc::new(AtomicUsize::new(0));
        let bot = bot(
            Settings::from_pairs([("scan.root", "app")]),
            Arc::new(Publisher::default()),
            &count,
        );

        assert_eq!(bot.registry().slash_handlers(), vec!["ping"]);
        assert_eq!(bot.tasks().len(), 1);
        assert_eq!(bot.tasks()[0].name(), "app::tasks::heartbeat");
    }

    #[tokio::test(start_paused = true)]
    async fn start_publishes_only_when_asked() {
        let count = Arc::new(AtomicUsize::new(0));
        let quiet = Arc::new(Publisher::default());
        let bot_quiet = bot(Settings::from_pairs([("scan.root", "app")]), quiet.clone(), &count);
        bot_quiet.start().await.unwrap();
        assert!(quiet.published.lock().unwrap().is_empty());
        bot_quiet.shutdown().await;

        let loud = Arc::new(Publisher::default());
        let bot_loud = bot(
            Settings::from_pairs([("scan.root", "app"), ("command.update", "true")]),
            loud.clone(),
            &count,
        );
        bot_loud.start().await.unwrap();
        assert_eq!(*loud.published.lock().unwrap(), vec![vec!["ping".to_string()]]);
        bot_loud.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_start_stop_and_restart() {
        let count = Arc::new(AtomicUsize::new(0));
        let config = Settings::new();
        let bot = bot(config, Arc::new(Publisher::default()), &count);

        assert_eq!(bot.start_tasks().await.unwrap(), 2);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert_eq!(bot.stop_tasks().await, 2);
        assert_eq!(bot.stop_tasks().await, 0);
        assert_eq!(bot.start_tasks().await.unwrap(), 2);
        assert_eq!(bot.restart_tasks().await.unwrap(), 2);

        bot.shutdown().await;
        assert_eq!(bot.task_status().await.state, SchedulerState::Stopped);
    }
}
