//! Shared types, error definitions, and utilities used across all tortuga crates.

pub mod boundary;
pub mod command;
pub mod error;
pub mod platform;
pub mod pool;
pub mod types;

pub use {
    boundary::Boundary,
    error::{BotContext, BotError, Result, Severity},
    platform::{PlatformClient, SlashEvent, TextEvent},
    pool::WorkerPool,
    types::{Color, Embed, OptionValue, Palette, Response},
};
