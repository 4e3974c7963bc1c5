//! Turns inbound chat events into handler executions.
//!
//! Both dispatchers return as soon as the work is spawned. Handlers run on a
//! shared [`WorkerPool`] sized by `dispatch.workers`; any failure becomes a
//! [`BotError`](tortuga_common::BotError) and is rendered back to the
//! originating channel or interaction.

pub mod error;
pub mod not_found;
mod render;
pub mod slash;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

use std::{fmt, sync::Arc};

use {
    serde::Serialize,
    tokio::task::JoinHandle,
    tortuga_commands::HandlerRegistry,
    tortuga_common::{Palette, PlatformClient, SlashEvent, TextEvent, WorkerPool},
    tortuga_config::{ConfigSource, keys},
};

pub use {
    error::Error,
    not_found::{LogNotFound, NotFoundHandler},
    slash::SlashDispatcher,
    text::{Dispatch, Ignored, TextDispatcher, parse_command, validate_message},
};

/// Which registry map an event is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Slash,
    Text,
}

impl RouteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slash => "slash",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Outcome {
    Handled,
    NotFound,
    /// Text command from a direct message whose handler is not DM-enabled.
    SkippedDirectMessage,
    Failed { warning: bool },
}

/// What happened to one routed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub kind: RouteKind,
    pub command: String,
    pub outcome: Outcome,
}

/// State shared by both dispatchers.
pub(crate) struct Shared {
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) client: Arc<dyn PlatformClient>,
    pub(crate) palette: Palette,
    pub(crate) pool: WorkerPool,
}

/// Text and slash dispatchers over one registry and worker pool.
#[derive(Clone)]
pub struct Dispatcher {
    text: TextDispatcher,
    slash: SlashDispatcher,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        client: Arc<dyn PlatformClient>,
        config: &dyn ConfigSource,
    ) -> Self {
        let workers = config.get_int_or(keys::DISPATCH_WORKERS, keys::DEFAULT_DISPATCH_WORKERS);
        let shared = Arc::new(Shared {
            registry,
            client,
            palette: Palette::from_config(config),
            pool: WorkerPool::new(usize::try_from(workers).unwrap_or(1)),
        });
        let not_found: Arc<dyn NotFoundHandler> = Arc::new(LogNotFound);

        Self {
            text: TextDispatcher::new(Arc::clone(&shared), Arc::clone(&not_found), config),
            slash: SlashDispatcher::new(shared, not_found),
        }
    }

    /// Replace the default log-and-drop fallback for unknown names.
    #[must_use]
    pub fn with_not_found(mut self, handler: Arc<dyn NotFoundHandler>) -> Self {
        self.text = self.text.with_not_found(Arc::clone(&handler));
        self.slash = self.slash.with_not_found(handler);
        self
    }

    pub fn on_message(&self, event: TextEvent) -> Dispatch {
        self.text.dispatch(event)
    }

    pub fn on_slash_command(&self, event: SlashEvent) -> JoinHandle<DispatchReport> {
        self.slash.dispatch(event)
    }

    pub fn text(&self) -> &TextDispatcher {
        &self.text
    }

    pub fn slash(&self) -> &SlashDispatcher {
        &self.slash
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        self.slash.registry()
    }

    pub fn workers(&self) -> usize {
        self.slash.workers()
    }
}
