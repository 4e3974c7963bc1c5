//! Sample commands served by the console host.

use {
    async_trait::async_trait,
    tortuga_commands::{CommandEntry, SlashContext, SlashHandler, TextContext, TextHandler, command},
    tortuga_common::{
        BotError, Response,
        command::{OptionKind, OptionSpec, PermissionFlag},
    },
};

pub fn entries() -> Vec<CommandEntry> {
    vec![
        command!("ping", "Check that the bot is alive").slash::<Ping>(),
        command!("hello", "Say hello").text::<Hello>(),
        command!("server", "Show the current server")
            .permissions([PermissionFlag::SendMessages, PermissionFlag::ViewChannel])
            .slash::<ServerInfo>()
            .text::<ServerInfo>(),
    ]
}

#[derive(Default)]
pub struct Ping;

#[async_trait]
impl SlashHandler for Ping {
    async fn handle(self: Box<Self>, ctx: SlashContext) -> Result<(), BotError> {
        let mut embed = ctx.success("Pong!");
        if ctx.bool_option("tag").unwrap_or(false) {
            embed = embed.description(format!("Hey {}!", ctx.user().name));
        }
        ctx.respond(Response::embed(embed)).await
    }

    fn enabled_in_dms(&self) -> bool {
        true
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::new("tag", "Mention me in the answer", OptionKind::Boolean)]
    }
}

#[derive(Default)]
pub struct Hello;

#[async_trait]
impl TextHandler for Hello {
    async fn handle(self: Box<Self>, ctx: TextContext) -> Result<(), BotError> {
        let name = if ctx.has_arg("tag") {
            format!("@{}", ctx.sender().name)
        } else {
            ctx.sender().name.clone()
        };
        ctx.reply(Response::embed(ctx.success(format!("Hello, {name}!"))))
            .await
    }

    fn enabled_in_dms(&self) -> bool {
        true
    }
}

/// Only meaningful inside a server.
#[derive(Default)]
pub struct ServerInfo;

#[async_trait]
impl SlashHandler for ServerInfo {
    async fn handle(self: Box<Self>, ctx: SlashContext) -> Result<(), BotError> {
        let server = ctx.require_server()?;
        let embed = ctx
            .success(server.name.clone())
            .description(format!("id {}", server.id));
        ctx.respond(Response::embed(embed)).await
    }
}

#[async_trait]
impl TextHandler for ServerInfo {
    async fn handle(self: Box<Self>, ctx: TextContext) -> Result<(), BotError> {
        let server = ctx.require_server()?;
        ctx.reply(Response::embed(ctx.success(server.name.clone())))
            .await
    }

    fn enabled_in_dms(&self) -> bool {
        true
    }
}
