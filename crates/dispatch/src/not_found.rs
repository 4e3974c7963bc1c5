use {
    async_trait::async_trait,
    tortuga_common::{BotError, SlashEvent, TextEvent},
    tracing::{error, warn},
};

use crate::{Error, RouteKind};

/// Fallback for event names with no registered handler.
///
/// Returning an error renders it back to the user like a handler failure.
#[async_trait]
pub trait NotFoundHandler: Send + Sync {
    async fn text_not_found(&self, event: &TextEvent, command: &str) -> Result<(), BotError> {
        warn!(
            user = %event.sender,
            channel = %event.channel.id,
            "{}",
            Error::not_found(RouteKind::Text, command)
        );
        Ok(())
    }

    async fn slash_not_found(&self, event: &SlashEvent) -> Result<(), BotError> {
        error!(
            user = %event.user,
            channel = %event.channel.id,
            "{}",
            Error::not_found(RouteKind::Slash, &event.command_name)
        );
        Ok(())
    }
}

/// Logs and drops.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotFound;

impl NotFoundHandler for LogNotFound {}
