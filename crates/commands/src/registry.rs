use std::collections::{BTreeSet, HashMap, hash_map::Entry};

use crate::{
    entry::CommandDeclaration,
    factory::{SlashFactory, TextFactory},
};

/// Name-keyed handler factories, one map per routing kind.
///
/// Each kind keeps the declaration of the entry that claimed the name, so a
/// name reused across kinds keeps both descriptions and permission sets.
/// Built once by [`scan_commands`](crate::scan_commands) and read-only
/// afterwards; share it behind an `Arc`.
#[derive(Default)]
pub struct HandlerRegistry {
    slash: HashMap<String, (SlashFactory, CommandDeclaration)>,
    text: HashMap<String, (TextFactory, CommandDeclaration)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and keeps the existing entry if the name is taken.
    pub(crate) fn insert_slash(&mut self, declaration: CommandDeclaration, factory: SlashFactory) -> bool {
        match self.slash.entry(declaration.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert((factory, declaration));
                true
            },
        }
    }

    pub(crate) fn insert_text(&mut self, declaration: CommandDeclaration, factory: TextFactory) -> bool {
        match self.text.entry(declaration.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert((factory, declaration));
                true
            },
        }
    }

    pub fn slash(&self, name: &str) -> Option<&SlashFactory> {
        self.slash.get(name).map(|(factory, _)| factory)
    }

    pub fn text(&self, name: &str) -> Option<&TextFactory> {
        self.text.get(name).map(|(factory, _)| factory)
    }

    pub fn slash_declaration(&self, name: &str) -> Option<&CommandDeclaration> {
        self.slash.get(name).map(|(_, declaration)| declaration)
    }

    pub fn text_declaration(&self, name: &str) -> Option<&CommandDeclaration> {
        self.text.get(name).map(|(_, declaration)| declaration)
    }

    /// Every declared command name across both kinds, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .slash
            .keys()
            .chain(self.text.keys())
            .map(String::as_str)
            .collect();
        names.into_iter().collect()
    }

    pub fn slash_handlers(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.slash.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn text_handlers(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.text.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.slash.is_empty() && self.text.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("slash", &self.slash_handlers())
            .field("text", &self.text_handlers())
            .finish()
    }
}
