use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::{debug, warn};

use crate::{
    env_subst,
    error::{Error, Result},
    loader::read_flattened,
    unit::TimeUnit,
};

/// Opaque key→string lookup with typed accessors.
///
/// Implementors only provide [`raw`](ConfigSource::raw); every accessor
/// resolves `${NAME}` indirection and falls back to the caller's default.
pub trait ConfigSource: Send + Sync {
    /// The stored value for `key`, without environment resolution.
    fn raw(&self, key: &str) -> Option<String>;

    /// Re-read the backing store. Sources without one keep their values.
    fn reload(&self) -> Result<()> {
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let raw = self.raw(key)?;
        let resolved = env_subst::resolve(&raw);
        if resolved.is_none() {
            debug!(key, value = %raw, "environment variable referenced by config is unset");
        }
        resolved
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| Error::missing(key))
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        match value.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!(key, value = %value, "config value is not an integer");
                None
            },
        }
    }

    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                warn!(key, value = %value, "config value is not a boolean");
                None
            },
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    fn get_time_unit(&self, key: &str) -> Option<TimeUnit> {
        let value = self.get(key)?;
        match value.parse() {
            Ok(unit) => Some(unit),
            Err(e) => {
                warn!(key, error = %e, "config value is not a time unit");
                None
            },
        }
    }
}

/// In-memory settings, optionally backed by a config file.
#[derive(Debug, Default)]
pub struct Settings {
    values: RwLock<BTreeMap<String, String>>,
    origin: Option<PathBuf>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, String>) -> Self {
        Self {
            values: RwLock::new(values),
            origin: None,
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn with_origin(mut self, path: PathBuf) -> Self {
        self.origin = Some(path);
        self
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigSource for Settings {
    fn raw(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn reload(&self) -> Result<()> {
        let Some(path) = &self.origin else {
            return Ok(());
        };
        let fresh = read_flattened(path)?;
        debug!(path = %path.display(), keys = fresh.len(), "reloaded config");
        *self.values.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        Ok(())
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn raw(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
