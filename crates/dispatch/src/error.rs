use {
    thiserror::Error,
    tortuga_common::{BotError, Severity},
};

use crate::RouteKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no {kind} handler registered for '{command}'")]
    HandlerNotFound { kind: RouteKind, command: String },

    #[error("failed to instantiate {kind} handler '{command}'")]
    Instantiation {
        kind: RouteKind,
        command: String,
        #[source]
        source: BotError,
    },

    #[error("{kind} handler '{command}' failed")]
    Execution {
        kind: RouteKind,
        command: String,
        #[source]
        source: BotError,
    },
}

impl Error {
    #[must_use]
    pub fn not_found(kind: RouteKind, command: impl Into<String>) -> Self {
        Self::HandlerNotFound {
            kind,
            command: command.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Execution { source, .. } if source.is_warning())
    }
}

impl From<Error> for BotError {
    fn from(err: Error) -> Self {
        match err {
            Error::Execution { source, .. } => source,
            Error::Instantiation { source, .. } => source.with_severity(Severity::Error),
            not_found @ Error::HandlerNotFound { .. } => Self::error(not_found.to_string()),
        }
    }
}
