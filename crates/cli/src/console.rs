//! Stdin/stdout stand-in for a chat platform.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use {
    async_trait::async_trait,
    tortuga_common::{
        OptionValue, PlatformClient, Response, SlashEvent, TextEvent,
        command::SlashCommandSpec,
        types::{ChannelKind, ChannelRef, InteractionRef, MessageRef, ServerRef, UserRef},
    },
    tracing::{info, warn},
};

/// Prints every outbound response to stdout.
#[derive(Debug, Default)]
pub struct ConsoleClient;

impl ConsoleClient {
    fn print(target: &str, response: &Response) {
        let visibility = if response.ephemeral {
            " (only you can see this)"
        } else {
            ""
        };
        for embed in &response.embeds {
            let title = embed.title.as_deref().unwrap_or_default();
            let color = embed.color.map(|c| c.to_string()).unwrap_or_default();
            println!("[{target}{visibility}] {color} {title}");
            if let Some(description) = &embed.description {
                println!("    {description}");
            }
        }
    }
}

#[async_trait]
impl PlatformClient for ConsoleClient {
    async fn reply(&self, message: &MessageRef, response: Response) -> anyhow::Result<()> {
        Self::print(&format!("reply to #{}", message.id), &response);
        Ok(())
    }

    async fn respond(&self, interaction: &InteractionRef, response: Response) -> anyhow::Result<()> {
        Self::print(&format!("interaction #{}", interaction.id), &response);
        Ok(())
    }

    async fn overwrite_commands(&self, commands: &[SlashCommandSpec]) -> anyhow::Result<Vec<String>> {
        let names: Vec<String> = commands.iter().map(|c| c.name.clone()).collect();
        info!(count = names.len(), "console accepted command list");
        Ok(names)
    }
}

/// One line of console input.
#[derive(Debug)]
pub enum ConsoleInput {
    Text(TextEvent),
    Slash(SlashEvent),
    /// `:reload`, re-read configuration and restart tasks.
    Reload,
    /// `:status`, print scheduler status.
    Status,
}

/// Turns console lines into platform events as one user in one channel.
#[derive(Debug)]
pub struct ConsoleSession {
    user: UserRef,
    direct: bool,
    next_id: AtomicU64,
}

impl ConsoleSession {
    /// `direct` makes every event arrive as a direct message.
    pub fn new(user: impl Into<String>, direct: bool) -> Self {
        Self {
            user: UserRef {
                id: "1".into(),
                name: user.into(),
            },
            direct,
            next_id: AtomicU64::new(1),
        }
    }

    /// `/name key=value ...` is a slash command, a `:` line is a console
    /// command, anything else non-blank is a text message.
    pub fn parse(&self, line: &str) -> Option<ConsoleInput> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }
        match line.trim() {
            ":reload" => return Some(ConsoleInput::Reload),
            ":status" => return Some(ConsoleInput::Status),
            _ => {},
        }
        if let Some(rest) = line.trim_start().strip_prefix('/') {
            return self.slash(rest).map(ConsoleInput::Slash);
        }
        Some(ConsoleInput::Text(self.text(line)))
    }

    fn slash(&self, rest: &str) -> Option<SlashEvent> {
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?;
        let mut options = BTreeMap::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    options.insert(key.to_string(), OptionValue::infer(value));
                },
                _ => warn!(token, "ignoring option without key=value form"),
            }
        }
        Some(SlashEvent {
            command_name: name.to_string(),
            options,
            user: self.user.clone(),
            channel: self.channel(),
            interaction: InteractionRef {
                id: self.next_id().to_string(),
                token: "console".into(),
            },
            server: self.server(),
        })
    }

    fn text(&self, content: &str) -> TextEvent {
        let channel = self.channel();
        TextEvent {
            sender: self.user.clone(),
            sender_is_self: false,
            content: content.to_string(),
            message: MessageRef {
                id: self.next_id().to_string(),
                channel_id: channel.id.clone(),
            },
            channel,
            server: self.server(),
        }
    }

    fn channel(&self) -> ChannelRef {
        if self.direct {
            ChannelRef {
                id: "dm".into(),
                name: self.user.name.clone(),
                kind: ChannelKind::Direct,
            }
        } else {
            ChannelRef {
                id: "console".into(),
                name: "console".into(),
                kind: ChannelKind::Server,
            }
        }
    }

    fn server(&self) -> Option<ServerRef> {
        (!self.direct).then(|| ServerRef {
            id: "local".into(),
            name: "localhost".into(),
        })
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
