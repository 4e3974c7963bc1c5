use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing configuration value for key '{key}'")]
    Missing { key: String },

    #[error("invalid value '{value}' for key '{key}', expected {expected}")]
    Invalid {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    #[must_use]
    pub fn invalid(key: impl Into<String>, value: impl Into<String>, expected: &'static str) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
