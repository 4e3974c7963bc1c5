#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    tortuga_commands::{
        CommandEntry, HandlerRegistry, SlashContext, SlashHandler, TextContext, TextHandler,
        scan_commands,
    },
    tortuga_common::{
        BotError, Boundary, OptionValue, PlatformClient, Response, SlashEvent, TextEvent,
        command::SlashCommandSpec,
        types::{ChannelKind, ChannelRef, InteractionRef, MessageRef, ServerRef, UserRef},
    },
};

#[derive(Default)]
pub(crate) struct RecordingClient {
    replies: Mutex<Vec<Response>>,
    responses: Mutex<Vec<Response>>,
}

impl RecordingClient {
    pub(crate) fn replies(&self) -> Vec<Response> {
        self.replies.lock().unwrap().clone()
    }

    pub(crate) fn responses(&self) -> Vec<Response> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClient for RecordingClient {
    async fn reply(&self, _message: &MessageRef, response: Response) -> anyhow::Result<()> {
        self.replies.lock().unwrap().push(response);
        Ok(())
    }

    async fn respond(&self, _interaction: &InteractionRef, response: Response) -> anyhow::Result<()> {
        self.responses.lock().unwrap().push(response);
        Ok(())
    }

    async fn overwrite_commands(&self, commands: &[SlashCommandSpec]) -> anyhow::Result<Vec<String>> {
        Ok(commands.iter().map(|c| c.name.clone()).collect())
    }
}

/// Every call fails, as if the platform were unreachable.
pub(crate) struct FailingClient;

#[async_trait]
impl PlatformClient for FailingClient {
    async fn reply(&self, _message: &MessageRef, _response: Response) -> anyhow::Result<()> {
        anyhow::bail!("connection reset")
    }

    async fn respond(&self, _interaction: &InteractionRef, _response: Response) -> anyhow::Result<()> {
        anyhow::bail!("connection reset")
    }

    async fn overwrite_commands(&self, _commands: &[SlashCommandSpec]) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("connection reset")
    }
}

/// Counts handler instantiations and records text arguments.
#[derive(Clone, Default)]
pub(crate) struct Probe {
    built: Arc<AtomicUsize>,
    args: Arc<Mutex<Vec<Vec<String>>>>,
}

struct ProbeHandler {
    args: Arc<Mutex<Vec<Vec<String>>>>,
}

#[async_trait]
impl TextHandler for ProbeHandler {
    async fn handle(self: Box<Self>, ctx: TextContext) -> Result<(), BotError> {
        self.args.lock().unwrap().push(ctx.args);
        Ok(())
    }
}

#[async_trait]
impl SlashHandler for ProbeHandler {
    async fn handle(self: Box<Self>, _ctx: SlashContext) -> Result<(), BotError> {
        Ok(())
    }
}

impl Probe {
    fn build(&self) -> ProbeHandler {
        self.built.fetch_add(1, Ordering::SeqCst);
        ProbeHandler {
            args: Arc::clone(&self.args),
        }
    }

    pub(crate) fn text_entry(&self, name: &str) -> CommandEntry {
        let probe = self.clone();
        CommandEntry::new("test", name, "probe").text_with(move || Ok(Box::new(probe.build())))
    }

    pub(crate) fn slash_entry(&self, name: &str) -> CommandEntry {
        let probe = self.clone();
        CommandEntry::new("test", name, "probe").slash_with(move || Ok(Box::new(probe.build())))
    }

    pub(crate) fn instantiations(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub(crate) fn args(&self) -> Vec<Vec<String>> {
        self.args.lock().unwrap().clone()
    }
}

pub(crate) fn registry_with(entries: impl IntoIterator<Item = CommandEntry>) -> Arc<HandlerRegistry> {
    Arc::new(scan_commands(entries, &Boundary::unbounded()))
}

fn user() -> UserRef {
    UserRef {
        id: "42".into(),
        name: "alice".into(),
    }
}

fn channel(in_server: bool) -> ChannelRef {
    ChannelRef {
        id: "100".into(),
        name: "general".into(),
        kind: if in_server {
            ChannelKind::Server
        } else {
            ChannelKind::Direct
        },
    }
}

fn server(in_server: bool) -> Option<ServerRef> {
    in_server.then(|| ServerRef {
        id: "7".into(),
        name: "crew".into(),
    })
}

pub(crate) fn text_event(content: &str, in_server: bool) -> TextEvent {
    TextEvent {
        sender: user(),
        sender_is_self: false,
        content: content.to_string(),
        channel: channel(in_server),
        message: MessageRef {
            id: "1".into(),
            channel_id: "100".into(),
        },
        server: server(in_server),
    }
}

pub(crate) fn slash_event(name: &str, options: &[(&str, &str)], in_server: bool) -> SlashEvent {
    SlashEvent {
        command_name: name.to_string(),
        options: options
            .iter()
            .map(|(k, v)| ((*k).to_string(), OptionValue::infer(v)))
            .collect(),
        user: user(),
        channel: channel(in_server),
        interaction: InteractionRef {
            id: "9".into(),
            token: "tok".into(),
        },
        server: server(in_server),
    }
}
