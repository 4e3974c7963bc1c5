use std::sync::Arc;

use {
    async_trait::async_trait,
    tortuga_common::{
        BotError, Embed, OptionValue, Palette, PlatformClient, Response, SlashEvent, TextEvent,
        command::OptionSpec,
        types::{ChannelRef, ServerRef, UserRef},
    },
};

/// A slash command.
///
/// A fresh instance is built for every interaction and consumed by
/// [`handle`](SlashHandler::handle). The remaining methods are declaration-time
/// properties, queried on an instance that has seen no request.
#[async_trait]
pub trait SlashHandler: Send {
    async fn handle(self: Box<Self>, ctx: SlashContext) -> Result<(), BotError>;

    fn enabled_in_dms(&self) -> bool {
        false
    }

    fn nsfw(&self) -> bool {
        false
    }

    fn options(&self) -> Vec<OptionSpec> {
        Vec::new()
    }
}

/// A prefixed text command. One instance per message.
#[async_trait]
pub trait TextHandler: Send {
    async fn handle(self: Box<Self>, ctx: TextContext) -> Result<(), BotError>;

    /// Whether the command runs in direct messages. Skipped silently otherwise.
    fn enabled_in_dms(&self) -> bool {
        false
    }
}

/// Request-scoped state handed to a [`SlashHandler`].
pub struct SlashContext {
    pub event: SlashEvent,
    pub client: Arc<dyn PlatformClient>,
    pub palette: Palette,
}

impl SlashContext {
    pub fn new(event: SlashEvent, client: Arc<dyn PlatformClient>, palette: Palette) -> Self {
        Self {
            event,
            client,
            palette,
        }
    }

    pub fn command(&self) -> &str {
        &self.event.command_name
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.event.options.get(name)
    }

    pub fn bool_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(OptionValue::as_bool)
    }

    pub fn user(&self) -> &UserRef {
        &self.event.user
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.event.channel
    }

    pub fn server(&self) -> Option<&ServerRef> {
        self.event.server.as_ref()
    }

    /// The server the interaction came from, or a "server required" error.
    pub fn require_server(&self) -> Result<&ServerRef, BotError> {
        self.server().ok_or_else(BotError::server_required)
    }

    /// An embed in the configured success color.
    pub fn success(&self, title: impl Into<String>) -> Embed {
        Embed::new().title(title).color(self.palette.success)
    }

    pub async fn respond(&self, response: Response) -> Result<(), BotError> {
        self.client
            .respond(&self.event.interaction, response)
            .await
            .map_err(BotError::from)
    }
}

/// Request-scoped state handed to a [`TextHandler`].
pub struct TextContext {
    pub event: TextEvent,
    /// Command name, prefix removed.
    pub command: String,
    /// Whitespace-delimited tokens after the command name.
    pub args: Vec<String>,
    pub client: Arc<dyn PlatformClient>,
    pub palette: Palette,
}

impl TextContext {
    pub fn new(
        event: TextEvent,
        command: String,
        args: Vec<String>,
        client: Arc<dyn PlatformClient>,
        palette: Palette,
    ) -> Self {
        Self {
            event,
            command,
            args,
            client,
            palette,
        }
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a.eq_ignore_ascii_case(arg))
    }

    pub fn sender(&self) -> &UserRef {
        &self.event.sender
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.event.channel
    }

    pub fn require_server(&self) -> Result<&ServerRef, BotError> {
        self.event.server.as_ref().ok_or_else(BotError::server_required)
    }

    pub fn success(&self, title: impl Into<String>) -> Embed {
        Embed::new().title(title).color(self.palette.success)
    }

    pub async fn reply(&self, response: Response) -> Result<(), BotError> {
        self.client
            .reply(&self.event.message, response)
            .await
            .map_err(BotError::from)
    }
}
