use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    source::Settings,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "tortuga.toml",
    "tortuga.yaml",
    "tortuga.yml",
    "tortuga.json",
];

/// Load settings from a specific file path, remembering it for refreshes.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let values = read_flattened(path)?;
    Ok(Settings::from_map(values).with_origin(path.to_path_buf()))
}

/// Read a config file and flatten it into dotted keys.
pub fn read_flattened(path: &Path) -> Result<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    let value = parse_config_value(&raw, path)?;
    let mut out = BTreeMap::new();
    flatten_into(&value, None, &mut out);
    Ok(out)
}

/// Discover and load settings from standard locations.
///
/// Search order:
/// 1. `./tortuga.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/tortuga/tortuga.{toml,yaml,yml,json}` (user-global)
///
/// Returns empty settings if no config file is found or it fails to parse.
pub fn discover_and_load() -> Settings {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_settings(&path) {
            Ok(settings) => return settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    Settings::new()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/tortuga` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tortuga").map(|d| d.config_dir().to_path_buf())
}

fn parse_config_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

fn flatten_into(value: &serde_json::Value, prefix: Option<&str>, out: &mut BTreeMap<String, String>) {
    use serde_json::Value;

    let key = |k: &str| match prefix {
        Some(p) => format!("{p}.{k}"),
        None => k.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(v, Some(&key(k)), out);
            }
        },
        Value::Null => {},
        other => {
            let Some(prefix) = prefix else {
                return;
            };
            let rendered = match other {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        v => v.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                v => v.to_string(),
            };
            out.insert(prefix.to_string(), rendered);
        },
    }
}
