use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::command::Command;
use crate::event::Snowflake;

/// Top-level commands keyed by default name.
pub struct CommandSet<C, E> {
    commands: BTreeMap<String, Arc<Command<C, E>>>,
}

impl<C, E> CommandSet<C, E> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Adds commands; a command with an already registered name replaces it.
    pub fn register(&mut self, commands: impl IntoIterator<Item = Command<C, E>>) {
        for command in commands {
            self.commands
                .insert(command.default_name().to_string(), Arc::new(command));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Command<C, E>>> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command<C, E>>> {
        self.commands.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// Splits into (global, per-guild) commands.
    pub fn partition_scopes(&self) -> (Vec<Arc<Command<C, E>>>, Vec<Arc<Command<C, E>>>) {
        self.commands
            .values()
            .cloned()
            .partition(|command| command.is_global_scope())
    }
}

impl<C, E> Default for CommandSet<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> std::fmt::Debug for CommandSet<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}

/// Users that bypass every permission check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owners {
    ids: HashSet<Snowflake>,
}

impl Owners {
    pub fn single(owner: Snowflake) -> Self {
        Self {
            ids: HashSet::from([owner]),
        }
    }

    pub fn team(members: impl IntoIterator<Item = Snowflake>) -> Self {
        Self {
            ids: members.into_iter().collect(),
        }
    }

    pub fn contains(&self, user: Snowflake) -> bool {
        self.ids.contains(&user)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
