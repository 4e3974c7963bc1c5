use std::{panic::AssertUnwindSafe, sync::Arc};

use {
    futures::FutureExt,
    tokio::task::JoinHandle,
    tortuga_commands::TextContext,
    tortuga_common::{BotError, TextEvent},
    tortuga_config::{ConfigSource, keys},
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use tortuga_metrics::{counter, dispatch as dispatch_metrics, histogram, labels};

use crate::{
    DispatchReport, Error, NotFoundHandler, Outcome, RouteKind, Shared,
    render::{log_failure, reply_error},
};

/// Why a text event was dropped before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    OwnMessage,
    EmptyContent,
    TooLong { length: usize, limit: usize },
    MissingPrefix,
    NoCommand,
}

impl Ignored {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnMessage => "own_message",
            Self::EmptyContent => "empty",
            Self::TooLong { .. } => "too_long",
            Self::MissingPrefix => "missing_prefix",
            Self::NoCommand => "no_command",
        }
    }
}

/// Result of offering a text event to the dispatcher.
#[derive(Debug)]
pub enum Dispatch {
    Ignored(Ignored),
    Spawned(JoinHandle<DispatchReport>),
}

impl Dispatch {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    /// Wait for the spawned handler. `None` if the event was dropped or the
    /// task was aborted.
    pub async fn report(self) -> Option<DispatchReport> {
        match self {
            Self::Ignored(_) => None,
            Self::Spawned(handle) => handle.await.ok(),
        }
    }
}

/// Check a text event and strip the prefix.
///
/// Returns the content after the prefix. A length at or above `limit`
/// (in characters) is rejected.
pub fn validate_message<'a>(
    event: &'a TextEvent,
    prefix: Option<&str>,
    limit: usize,
) -> Result<&'a str, Ignored> {
    if event.sender_is_self {
        return Err(Ignored::OwnMessage);
    }
    let content = event.content.as_str();
    if content.trim().is_empty() {
        return Err(Ignored::EmptyContent);
    }
    let length = content.chars().count();
    if length >= limit {
        return Err(Ignored::TooLong { length, limit });
    }
    match prefix {
        Some(prefix) => content.strip_prefix(prefix).ok_or(Ignored::MissingPrefix),
        None => Ok(content),
    }
}

/// Split prefix-free content into the command name and its arguments.
pub fn parse_command(body: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = body.split_whitespace();
    let command = tokens.next()?.to_string();
    Some((command, tokens.map(str::to_string).collect()))
}

/// Routes prefixed chat messages to [`TextHandler`](tortuga_commands::TextHandler)s.
#[derive(Clone)]
pub struct TextDispatcher {
    shared: Arc<Shared>,
    not_found: Arc<dyn NotFoundHandler>,
    prefix: Option<String>,
    limit: usize,
}

impl TextDispatcher {
    pub(crate) fn new(
        shared: Arc<Shared>,
        not_found: Arc<dyn NotFoundHandler>,
        config: &dyn ConfigSource,
    ) -> Self {
        let prefix = config
            .get(keys::COMMAND_TEXT_PREFIX)
            .filter(|p| !p.is_empty());
        let limit = config.get_int_or(
            keys::MESSAGE_CHARACTER_LIMIT,
            keys::DEFAULT_MESSAGE_CHARACTER_LIMIT,
        );
        Self {
            shared,
            not_found,
            prefix,
            limit: usize::try_from(limit).unwrap_or(0),
        }
    }

    pub(crate) fn with_not_found(mut self, not_found: Arc<dyn NotFoundHandler>) -> Self {
        self.not_found = not_found;
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Validate `event` and, if it names a command, spawn its handler.
    ///
    /// Never waits for the handler.
    pub fn dispatch(&self, event: TextEvent) -> Dispatch {
        let parsed = validate_message(&event, self.prefix(), self.limit)
            .and_then(|body| parse_command(body).ok_or(Ignored::NoCommand));

        let (command, args) = match parsed {
            Ok(parsed) => parsed,
            Err(reason) => {
                debug!(message = %event.message.id, reason = reason.as_str(), "ignoring text message");
                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::IGNORED_TOTAL, labels::REASON => reason.as_str()).increment(1);
                return Dispatch::Ignored(reason);
            },
        };

        info!(command = %command, user = %event.sender, channel = %event.channel.id, "text command received");
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::EVENTS_TOTAL, labels::KIND => "text").increment(1);

        let shared = Arc::clone(&self.shared);
        let not_found = Arc::clone(&self.not_found);
        let pool = shared.pool.clone();
        Dispatch::Spawned(pool.spawn(run(shared, not_found, event, command, args)))
    }
}

async fn run(
    shared: Arc<Shared>,
    not_found: Arc<dyn NotFoundHandler>,
    event: TextEvent,
    command: String,
    args: Vec<String>,
) -> DispatchReport {
    let report = |outcome| DispatchReport {
        kind: RouteKind::Text,
        command: command.clone(),
        outcome,
    };

    let Some(factory) = shared.registry.text(&command).cloned() else {
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::NOT_FOUND_TOTAL, labels::KIND => "text").increment(1);
        if let Err(source) = not_found.text_not_found(&event, &command).await {
            let err = Error::Execution {
                kind: RouteKind::Text,
                command: command.clone(),
                source,
            };
            log_failure(&err);
            reply_error(&shared, &event.message, err.into()).await;
        }
        return report(Outcome::NotFound);
    };

    let message = event.message.clone();
    let direct = event.channel.is_direct();
    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();

    let execution = AssertUnwindSafe(async {
        let handler = factory().map_err(|source| Error::Instantiation {
            kind: RouteKind::Text,
            command: command.clone(),
            source,
        })?;
        if direct && !handler.enabled_in_dms() {
            return Ok(Outcome::SkippedDirectMessage);
        }
        let ctx = TextContext::new(
            event,
            command.clone(),
            args,
            Arc::clone(&shared.client),
            shared.palette,
        );
        handler
            .handle(ctx)
            .await
            .map_err(|source| Error::Execution {
                kind: RouteKind::Text,
                command: command.clone(),
                source,
            })?;
        Ok::<_, Error>(Outcome::Handled)
    })
    .catch_unwind()
    .await;

    #[cfg(feature = "metrics")]
    histogram!(dispatch_metrics::HANDLER_DURATION_SECONDS, labels::KIND => "text")
        .record(started.elapsed().as_secs_f64());

    let result = execution.unwrap_or_else(|payload| {
        Err(Error::Execution {
            kind: RouteKind::Text,
            command: command.clone(),
            source: BotError::panicked(payload.as_ref()),
        })
    });

    match result {
        Ok(Outcome::SkippedDirectMessage) => {
            debug!(command = %command, "text command not enabled in direct messages");
            report(Outcome::SkippedDirectMessage)
        },
        Ok(outcome) => report(outcome),
        Err(err) => {
            log_failure(&err);
            let warning = err.is_warning();
            #[cfg(feature = "metrics")]
            counter!(
                dispatch_metrics::FAILURES_TOTAL,
                labels::KIND => "text",
                labels::SEVERITY => if warning { "warning" } else { "error" }
            )
            .increment(1);
            reply_error(&shared, &message, err.into()).await;
            report(Outcome::Failed { warning })
        },
    }
}
