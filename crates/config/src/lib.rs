//! Configuration lookup for tortuga.
//!
//! Config files: `tortuga.toml`, `tortuga.yaml`, `tortuga.yml` or `tortuga.json`.
//! Searched in `./` then `~/.config/tortuga/`.
//!
//! Nested tables are flattened into dotted keys, so `[command.text] prefix = "!"`
//! is looked up as `command.text.prefix`. A value of the exact form `${NAME}`
//! resolves to the environment variable `NAME`.

pub mod env_subst;
pub mod error;
pub mod keys;
pub mod loader;
pub mod source;
pub mod unit;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_settings},
    source::{ConfigSource, Settings},
    unit::{TimeUnit, UnknownTimeUnit},
};
