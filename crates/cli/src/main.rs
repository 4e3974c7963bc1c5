mod console;
mod handlers;
mod tasks;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tokio::io::{AsyncBufReadExt, BufReader},
    tortuga_bot::Bot,
    tortuga_config::{ConfigSource, Settings, keys},
    tortuga_cron::resolve_schedule,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::console::{ConsoleClient, ConsoleInput, ConsoleSession};

#[derive(Parser)]
#[command(name = "tortuga", about = "tortuga: chat commands and periodic tasks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./tortuga.toml and ~/.config/tortuga/).
    #[arg(long, global = true, env = "TORTUGA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read events from stdin and run scheduled tasks (default).
    Run {
        /// Deliver every event as a direct message.
        #[arg(long, default_value_t = false)]
        direct: bool,
        /// Display name of the console user.
        #[arg(long, default_value = "console")]
        user: String,
    },
    /// Print the slash command publishing payload as JSON.
    Commands,
    /// Print each declared task's resolved schedule.
    Tasks,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Arc<Settings>> {
    let settings = match path {
        Some(path) => tortuga_config::load_settings(path)?,
        None => tortuga_config::discover_and_load(),
    };
    if let Some(origin) = settings.origin() {
        info!(path = %origin.display(), keys = settings.len(), "config loaded");
    }
    Ok(Arc::new(settings))
}

fn build_bot(config: Arc<Settings>) -> anyhow::Result<Bot> {
    Ok(Bot::builder(config)
        .commands(handlers::entries())
        .tasks(tasks::candidates())
        .client(Arc::new(ConsoleClient))
        .build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "tortuga starting");

    let config = load_config(cli.config.as_ref())?;
    if config.get(keys::TOKEN).is_none() {
        warn!("no platform token configured");
    }
    let bot = build_bot(config)?;

    match cli.command {
        None => run(&bot, ConsoleSession::new("console", false)).await,
        Some(Commands::Run { direct, user }) => run(&bot, ConsoleSession::new(user, direct)).await,
        Some(Commands::Commands) => {
            println!("{}", serde_json::to_string_pretty(&bot.slash_commands())?);
            Ok(())
        },
        Some(Commands::Tasks) => {
            print_tasks(&bot);
            Ok(())
        },
    }
}

async fn run(bot: &Bot, session: ConsoleSession) -> anyhow::Result<()> {
    let scheduled = bot.start().await?;
    info!(scheduled, "ready; type /name key=value or a text message");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("end of input");
                    break;
                };
                handle_line(bot, &session, &line).await;
            },
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            },
        }
    }

    bot.shutdown().await;
    Ok(())
}

async fn handle_line(bot: &Bot, session: &ConsoleSession, line: &str) {
    match session.parse(line) {
        None => {},
        Some(ConsoleInput::Text(event)) => {
            if let Some(report) = bot.on_message(event).report().await {
                info!(command = %report.command, outcome = ?report.outcome, "text command done");
            }
        },
        Some(ConsoleInput::Slash(event)) => match bot.on_slash_command(event).await {
            Ok(report) => {
                info!(command = %report.command, outcome = ?report.outcome, "slash command done");
            },
            Err(e) => warn!(error = %e, "slash handler task failed"),
        },
        Some(ConsoleInput::Reload) => match bot.restart_tasks().await {
            Ok(scheduled) => info!(scheduled, "tasks restarted"),
            Err(e) => warn!(error = %e, "reload failed"),
        },
        Some(ConsoleInput::Status) => {
            let status = bot.task_status().await;
            println!(
                "scheduler {}: {} declared, {} enabled, {} scheduled, {} running",
                status.state, status.declared, status.enabled, status.scheduled, status.in_flight
            );
        },
    }
}

fn print_tasks(bot: &Bot) {
    let config = bot.config();
    for task in bot.tasks() {
        let enabled = config.get_bool_or(&keys::task_enabled(task.name()), true);
        match resolve_schedule(task.name(), task.spec(), config.as_ref()) {
            Ok(schedule) if enabled => println!("{}  {schedule}", task.name()),
            Ok(schedule) => println!("{}  {schedule} (disabled)", task.name()),
            Err(e) => println!("{}  unresolved: {e}", task.name()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn explicit_config_file_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[command.text]\nprefix = \"!\"\n[scheduler.otherStuff]\ndelay = 1").unwrap();

        let config = load_config(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.get(keys::COMMAND_TEXT_PREFIX).as_deref(), Some("!"));
        assert_eq!(config.get_int("scheduler.otherStuff.delay"), Some(1));
    }

    #[tokio::test]
    async fn console_bot_handles_lines() {
        let config = Arc::new(Settings::from_pairs([("command.text.prefix", "!")]));
        let bot = build_bot(config).unwrap();
        let session = ConsoleSession::new("alice", false);

        handle_line(&bot, &session, "/ping tag=true").await;
        handle_line(&bot, &session, "!hello").await;
        handle_line(&bot, &session, ":status").await;

        assert_eq!(bot.registry().slash_handlers(), vec!["ping", "server"]);
        assert_eq!(bot.tasks().len(), 3);
    }
}
