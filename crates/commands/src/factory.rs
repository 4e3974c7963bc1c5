use std::sync::Arc;

use tortuga_common::BotError;

use crate::handler::{SlashHandler, TextHandler};

/// Builds a fresh slash handler per interaction.
pub type SlashFactory = Arc<dyn Fn() -> Result<Box<dyn SlashHandler>, BotError> + Send + Sync>;

/// Builds a fresh text handler per message.
pub type TextFactory = Arc<dyn Fn() -> Result<Box<dyn TextHandler>, BotError> + Send + Sync>;

pub fn slash_factory<T>() -> SlashFactory
where
    T: SlashHandler + Default + 'static,
{
    Arc::new(|| Ok(Box::new(T::default()) as Box<dyn SlashHandler>))
}

pub fn text_factory<T>() -> TextFactory
where
    T: TextHandler + Default + 'static,
{
    Arc::new(|| Ok(Box::new(T::default()) as Box<dyn TextHandler>))
}
