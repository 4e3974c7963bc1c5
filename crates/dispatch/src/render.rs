use {
    tortuga_common::{
        BotError, Response,
        types::{InteractionRef, MessageRef},
    },
    tracing::{error, warn},
};

use crate::{Error, Shared};

pub(crate) fn log_failure(err: &Error) {
    match err {
        Error::HandlerNotFound { kind, command } => {
            warn!(kind = %kind, command = %command, "{err}");
        },
        Error::Instantiation {
            kind,
            command,
            source,
        } => {
            error!(kind = %kind, command = %command, error = %source.cause_chain(), "failed to instantiate handler");
        },
        Error::Execution {
            kind,
            command,
            source,
        } if source.is_warning() => {
            warn!(kind = %kind, command = %command, message = %source, "handler returned a warning");
        },
        Error::Execution {
            kind,
            command,
            source,
        } => {
            error!(kind = %kind, command = %command, error = %source.cause_chain(), "handler failed");
        },
    }
}

/// Answer a text message with the error embed.
pub(crate) async fn reply_error(shared: &Shared, message: &MessageRef, err: BotError) {
    let response = Response::embed(err.embed(&shared.palette));
    if let Err(e) = shared.client.reply(message, response).await {
        warn!(message = %message.id, error = %e, "failed to send error reply");
    }
}

/// Answer a slash interaction with the error embed; errors are ephemeral.
pub(crate) async fn respond_error(shared: &Shared, interaction: &InteractionRef, err: BotError) {
    let response = Response::embed(err.embed(&shared.palette)).ephemeral(err.ephemeral());
    if let Err(e) = shared.client.respond(interaction, response).await {
        warn!(interaction = %interaction.id, error = %e, "failed to send error response");
    }
}
