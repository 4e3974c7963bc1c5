//! Command metadata published to the chat platform.

use serde::{Deserialize, Serialize};

use crate::types::OptionValue;

/// Permission a member needs to invoke a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionFlag {
    Administrator,
    ManageServer,
    ManageChannels,
    ManageRoles,
    ManageMessages,
    KickMembers,
    BanMembers,
    ViewChannel,
    #[default]
    SendMessages,
    EmbedLinks,
    AttachFiles,
    AddReactions,
    MentionEveryone,
    UseApplicationCommands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: OptionValue,
}

/// One parameter of a slash command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            choices: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn choice(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.choices.push(OptionChoice {
            name: name.into(),
            value,
        });
        self
    }
}

/// Bulk-registration payload for one slash command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashCommandSpec {
    pub name: String,
    pub description: String,
    pub permissions: Vec<PermissionFlag>,
    pub enabled_in_dms: bool,
    pub nsfw: bool,
    pub options: Vec<OptionSpec>,
}
