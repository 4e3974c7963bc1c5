use {
    tortuga_common::Boundary,
    tracing::{debug, info, warn},
};

use crate::{entry::CommandEntry, registry::HandlerRegistry};

/// Build the registry from declared commands.
///
/// Entries outside `boundary` are skipped. An entry with no handler kind is
/// rejected. When two entries claim the same name for one kind, the first
/// keeps it. Never fails: rejected entries are logged and left out.
pub fn scan_commands(
    entries: impl IntoIterator<Item = CommandEntry>,
    boundary: &Boundary,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    for entry in entries {
        let name = entry.declaration.name.trim().to_string();

        if !boundary.contains(&entry.module) {
            debug!(command = %name, module = %entry.module, "command outside scan root, skipping");
            continue;
        }
        if name.is_empty() {
            warn!(module = %entry.module, "command declared without a name, skipping");
            continue;
        }
        if entry.slash.is_none() && entry.text.is_none() {
            warn!(command = %name, module = %entry.module, "command has no slash or text handler, skipping");
            continue;
        }

        let mut declaration = entry.declaration;
        declaration.name = name.clone();
        if let Some(factory) = entry.slash
            && !registry.insert_slash(declaration.clone(), factory)
        {
            warn!(command = %name, module = %entry.module, "duplicate slash command, keeping the first declaration");
        }
        if let Some(factory) = entry.text
            && !registry.insert_text(declaration, factory)
        {
            warn!(command = %name, module = %entry.module, "duplicate text command, keeping the first declaration");
        }
    }

    info!(
        slash = ?registry.slash_handlers(),
        text = ?registry.text_handlers(),
        "registered commands"
    );
    registry
}
