//! Inbound event shapes and the outbound chat-platform port.

use std::collections::BTreeMap;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::{
    command::SlashCommandSpec,
    types::{ChannelRef, InteractionRef, MessageRef, OptionValue, Response, ServerRef, UserRef},
};

/// A chat message that may be a prefixed text command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEvent {
    pub sender: UserRef,
    /// The message was sent by this bot.
    pub sender_is_self: bool,
    pub content: String,
    pub channel: ChannelRef,
    pub message: MessageRef,
    #[serde(default)]
    pub server: Option<ServerRef>,
}

/// A platform-native slash interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashEvent {
    pub command_name: String,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
    pub user: UserRef,
    pub channel: ChannelRef,
    pub interaction: InteractionRef,
    #[serde(default)]
    pub server: Option<ServerRef>,
}

/// Outbound calls into the chat platform.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Reply to a text message.
    async fn reply(&self, message: &MessageRef, response: Response) -> anyhow::Result<()>;

    /// Answer a slash interaction.
    async fn respond(&self, interaction: &InteractionRef, response: Response) -> anyhow::Result<()>;

    /// Replace every global slash command; returns the names the platform accepted.
    async fn overwrite_commands(&self, commands: &[SlashCommandSpec]) -> anyhow::Result<Vec<String>>;
}
