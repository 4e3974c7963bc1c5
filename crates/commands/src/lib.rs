//! Command handlers and the registry that routes names to them.
//!
//! Hosts list their commands as [`CommandEntry`] values (usually via the
//! [`command!`] macro), then [`scan_commands`] builds an immutable
//! [`HandlerRegistry`] keyed by name, one map per routing kind.

pub mod entry;
pub mod factory;
pub mod handler;
pub mod publish;
pub mod registry;
pub mod scanner;

pub use {
    entry::{CommandDeclaration, CommandEntry},
    factory::{SlashFactory, TextFactory, slash_factory, text_factory},
    handler::{SlashContext, SlashHandler, TextContext, TextHandler},
    publish::slash_commands,
    registry::HandlerRegistry,
    scanner::scan_commands,
};
