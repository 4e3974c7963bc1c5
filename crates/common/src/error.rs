use std::{any::Any, error::Error as StdError, fmt};

use serde::{Deserialize, Serialize};

use crate::types::{Embed, Palette};

const DEFAULT_TITLE: &str = "Error!";
const SERVER_REQUIRED: &str = "You have to be in a server!";

/// How a failure is reported back to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Soft, user-caused. Logged at `warn`, rendered visibly.
    Warning,
    /// Hard, unexpected. Logged at `error` with the cause chain, rendered ephemeral.
    #[default]
    Error,
}

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Recoverable failure raised by command handlers and carried through dispatch.
pub struct BotError {
    message: Option<String>,
    cause: Option<Cause>,
    severity: Severity,
}

impl BotError {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            cause: None,
            severity: Severity::Error,
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            cause: None,
            severity: Severity::Warning,
        }
    }

    /// An error whose user-facing text is taken from `cause`.
    #[must_use]
    pub fn from_cause(cause: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: None,
            cause: Some(Box::new(cause)),
            severity: Severity::Error,
        }
    }

    /// The command can only run inside a server channel.
    #[must_use]
    pub fn server_required() -> Self {
        Self::error(SERVER_REQUIRED)
    }

    /// A handler or job panicked with `payload`.
    #[must_use]
    pub fn panicked(payload: &(dyn Any + Send)) -> Self {
        Self::error(format!("handler panicked: {}", panic_message(payload)))
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Warnings are shown to everyone, errors only to the invoking user.
    pub fn ephemeral(&self) -> bool {
        !self.is_warning()
    }

    /// Every message in the cause chain, outermost first, joined by `": "`.
    pub fn cause_chain(&self) -> String {
        let mut parts = Vec::new();
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        let mut next: Option<&(dyn StdError + 'static)> = self.cause.as_deref().map(|c| c as _);
        while let Some(err) = next {
            parts.push(err.to_string());
            next = err.source();
        }
        if parts.is_empty() {
            parts.push(DEFAULT_TITLE.to_string());
        }
        parts.join(": ")
    }

    /// Render as an embed.
    ///
    /// A warning's message becomes the title; an error keeps the generic
    /// title and carries its message in the description. Without a message,
    /// the description falls back to the cause.
    pub fn embed(&self, palette: &Palette) -> Embed {
        let color = match self.severity {
            Severity::Warning => palette.warning,
            Severity::Error => palette.error,
        };
        let cause_text = self.cause.as_ref().map(ToString::to_string);

        let embed = match (&self.message, self.severity) {
            (Some(message), Severity::Warning) => Embed::new().title(message.clone()),
            (Some(message), Severity::Error) => {
                Embed::new().title(DEFAULT_TITLE).description(message.clone())
            },
            (None, _) => {
                let embed = Embed::new().title(DEFAULT_TITLE);
                match cause_text {
                    Some(text) => embed.description(text),
                    None => embed,
                }
            },
        };
        embed.color(color)
    }
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.cause) {
            (Some(message), _) => f.write_str(message),
            (None, Some(cause)) => write!(f, "{cause}"),
            (None, None) => f.write_str(DEFAULT_TITLE),
        }
    }
}

impl fmt::Debug for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotError")
            .field("message", &self.message)
            .field("cause", &self.cause)
            .field("severity", &self.severity)
            .finish()
    }
}

impl StdError for BotError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as _)
    }
}

impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        Self::from_cause(AnyhowCause(err))
    }
}

impl From<tortuga_config::Error> for BotError {
    fn from(err: tortuga_config::Error) -> Self {
        Self::from_cause(err)
    }
}

/// `anyhow::Error` does not implement `std::error::Error` itself.
struct AnyhowCause(anyhow::Error);

impl fmt::Debug for AnyhowCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for AnyhowCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for AnyhowCause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// `.warning()` and `.error_context()` on `Result` and `Option`.
pub trait BotContext<T> {
    /// Fail with a user-facing warning.
    fn warning(self, message: impl Into<String>) -> Result<T>;
    /// Fail with an error that keeps the original failure as its cause.
    fn error_context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E> BotContext<T> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn warning(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| BotError::warning(message).with_cause(e))
    }

    fn error_context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| BotError::error(message).with_cause(e))
    }
}

impl<T> BotContext<T> for Option<T> {
    fn warning(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| BotError::warning(message))
    }

    fn error_context(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| BotError::error(message))
    }
}
