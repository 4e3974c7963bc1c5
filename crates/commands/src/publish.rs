use {tortuga_common::command::SlashCommandSpec, tracing::warn};

use crate::registry::HandlerRegistry;

/// Publishing payload for every registered slash command, sorted by name.
///
/// Each command's declaration-time properties are read from a fresh
/// instance. A command whose handler cannot be built is left out.
pub fn slash_commands(registry: &HandlerRegistry) -> Vec<SlashCommandSpec> {
    registry
        .slash_handlers()
        .into_iter()
        .filter_map(|name| {
            let factory = registry.slash(name)?;
            let declaration = registry.slash_declaration(name)?;
            let handler = match factory() {
                Ok(handler) => handler,
                Err(e) => {
                    warn!(command = name, error = %e, "cannot instantiate slash command for publishing");
                    return None;
                },
            };
            Some(SlashCommandSpec {
                name: declaration.name.clone(),
                description: declaration.description.clone(),
                permissions: declaration.permissions.iter().copied().collect(),
                enabled_in_dms: handler.enabled_in_dms(),
                nsfw: handler.nsfw(),
                options: handler.options(),
            })
        })
        .collect()
}
