use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no platform client configured")]
    MissingClient,

    #[error(transparent)]
    Scheduler(#[from] tortuga_cron::Error),

    #[error(transparent)]
    Config(#[from] tortuga_config::Error),

    #[error("{context}: {error:#}")]
    Platform {
        context: &'static str,
        error: anyhow::Error,
    },
}

impl Error {
    #[must_use]
    pub fn platform(context: &'static str, error: anyhow::Error) -> Self {
        Self::Platform { context, error }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
