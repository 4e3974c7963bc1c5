use std::{collections::BTreeSet, sync::Arc};

use tortuga_common::{BotError, command::PermissionFlag};

use crate::{
    factory::{SlashFactory, TextFactory, slash_factory, text_factory},
    handler::{SlashHandler, TextHandler},
};

/// Name, description and required permissions of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDeclaration {
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<PermissionFlag>,
}

impl CommandDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            permissions: BTreeSet::from([PermissionFlag::default()]),
        }
    }
}

/// One declared command with the handler kinds it supports.
///
/// ```rust,ignore
/// tortuga_commands::command!("ping", "Ping the bot")
///     .slash::<Ping>()
///     .text::<Ping>()
/// ```
#[derive(Clone)]
pub struct CommandEntry {
    pub declaration: CommandDeclaration,
    /// Module path the command was declared in, checked against `scan.root`.
    pub module: String,
    pub(crate) slash: Option<SlashFactory>,
    pub(crate) text: Option<TextFactory>,
}

impl CommandEntry {
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            declaration: CommandDeclaration::new(name, description),
            module: module.into(),
            slash: None,
            text: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Replace the default `SEND_MESSAGES` requirement.
    #[must_use]
    pub fn permissions(mut self, permissions: impl IntoIterator<Item = PermissionFlag>) -> Self {
        self.declaration.permissions = permissions.into_iter().collect();
        self
    }

    #[must_use]
    pub fn slash<T>(mut self) -> Self
    where
        T: SlashHandler + Default + 'static,
    {
        self.slash = Some(slash_factory::<T>());
        self
    }

    /// Slash capability backed by a fallible constructor.
    #[must_use]
    pub fn slash_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn SlashHandler>, BotError> + Send + Sync + 'static,
    {
        self.slash = Some(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn text<T>(mut self) -> Self
    where
        T: TextHandler + Default + 'static,
    {
        self.text = Some(text_factory::<T>());
        self
    }

    #[must_use]
    pub fn text_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn TextHandler>, BotError> + Send + Sync + 'static,
    {
        self.text = Some(Arc::new(factory));
        self
    }

    pub fn has_slash(&self) -> bool {
        self.slash.is_some()
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("declaration", &self.declaration)
            .field("module", &self.module)
            .field("slash", &self.has_slash())
            .field("text", &self.has_text())
            .finish()
    }
}

/// Declare a command in the current module.
#[macro_export]
macro_rules! command {
    ($name:expr, $description:expr $(,)?) => {
        $crate::CommandEntry::new(module_path!(), $name, $description)
    };
}
