//! Declarative command descriptors and their per-event handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::{BoxError, ValidationError};
use crate::event::InteractionKind;
use crate::locale::LocalizedString;
use crate::option::CommandOption;
use crate::payload::{CommandKind, CommandPayload, IntegrationType, InteractionContext};

pub type HandlerResult = Result<(), BoxError>;

/// Stored handler for one event kind.
pub type Handler<C, E> = Arc<dyn Fn(C, E) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Stored permission predicate. An `Err` counts as a denial.
pub type PermissionCheck<C, E> =
    Arc<dyn Fn(C, E) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync>;

/// Everything needed to create a [`Command`].
#[derive(Debug, Clone)]
pub struct CommandInfo {
    pub name: LocalizedString,
    pub description: Option<LocalizedString>,
    pub kind: CommandKind,
    pub options: Vec<CommandOption>,
    pub owners_only: bool,
    pub nsfw: bool,
    pub integration_types: Vec<IntegrationType>,
    pub contexts: Vec<InteractionContext>,
}

impl CommandInfo {
    pub fn new(name: impl Into<LocalizedString>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: CommandKind::ChatInput,
            options: Vec::new(),
            owners_only: false,
            nsfw: false,
            integration_types: Vec::new(),
            contexts: Vec::new(),
        }
    }

    /// Shorthand for a chat-input command with a description.
    pub fn chat_input(
        name: impl Into<LocalizedString>,
        description: impl Into<LocalizedString>,
    ) -> Self {
        Self::new(name).description(description)
    }

    pub fn description(mut self, description: impl Into<LocalizedString>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = CommandOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn owners_only(mut self, owners_only: bool) -> Self {
        self.owners_only = owners_only;
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn integration_types(mut self, types: impl IntoIterator<Item = IntegrationType>) -> Self {
        self.integration_types = types.into_iter().collect();
        self
    }

    pub fn contexts(mut self, contexts: impl IntoIterator<Item = InteractionContext>) -> Self {
        self.contexts = contexts.into_iter().collect();
        self
    }
}

/// A set of subcommands registered under one group name.
pub struct SubcommandGroup<C, E> {
    pub name: LocalizedString,
    pub description: LocalizedString,
    pub commands: Vec<Command<C, E>>,
}

impl<C, E> SubcommandGroup<C, E> {
    pub fn new(
        name: impl Into<LocalizedString>,
        description: impl Into<LocalizedString>,
        commands: Vec<Command<C, E>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            commands,
        }
    }
}

/// One invokable unit: a top-level command or a subcommand.
///
/// Subcommands are kept in a flat list. A subcommand that belongs to a
/// group has its default name rewritten to `"<group> <sub>"`, which is
/// the only place group membership is recorded; the router rebuilds the
/// same composite name to find it.
pub struct Command<C, E> {
    name: LocalizedString,
    description: LocalizedString,
    kind: CommandKind,
    options: Vec<CommandOption>,
    subcommands: Vec<Command<C, E>>,
    handlers: HashMap<InteractionKind, Handler<C, E>>,
    permission: PermissionCheck<C, E>,
    owners_only: bool,
    nsfw: bool,
    integration_types: Vec<IntegrationType>,
    contexts: Vec<InteractionContext>,
}

impl<C, E> Command<C, E>
where
    C: Send + 'static,
    E: Send + 'static,
{
    /// Validates `info` and builds a descriptor with no handlers and an
    /// allow-all permission predicate.
    pub fn create(info: CommandInfo) -> Result<Self, ValidationError> {
        if info.name.default_value().trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let (description, options) = match info.kind {
            CommandKind::ChatInput => {
                let description = info
                    .description
                    .filter(|d| !d.default_value().is_empty())
                    .ok_or_else(|| ValidationError::MissingDescription {
                        command: info.name.default_value().to_string(),
                    })?;
                (description, info.options)
            }
            CommandKind::User | CommandKind::Message => (LocalizedString::new(""), Vec::new()),
        };

        Ok(Self {
            name: info.name,
            description,
            kind: info.kind,
            options,
            subcommands: Vec::new(),
            handlers: HashMap::new(),
            permission: allow_all(),
            owners_only: info.owners_only,
            nsfw: info.nsfw,
            integration_types: info.integration_types,
            contexts: info.contexts,
        })
    }

    /// Sets the handler for `kind`, replacing any previous one.
    pub fn add_handler<F, Fut>(mut self, kind: InteractionKind, handler: F) -> Self
    where
        F: Fn(C, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: Handler<C, E> =
            Arc::new(move |ctx, event| -> BoxFuture<'static, HandlerResult> {
                Box::pin(handler(ctx, event))
            });
        self.handlers.insert(kind, handler);
        self
    }

    pub fn set_permission<F, Fut>(mut self, check: F) -> Self
    where
        F: Fn(C, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
    {
        self.permission = Arc::new(
            move |ctx, event| -> BoxFuture<'static, Result<bool, BoxError>> {
                Box::pin(check(ctx, event))
            },
        );
        self
    }

    /// Appends direct subcommands and their `subcommand` option entries.
    pub fn add_subcommands(mut self, commands: Vec<Command<C, E>>) -> Self {
        for command in commands {
            self.options.push(command.as_subcommand_option());
            self.subcommands.push(command);
        }
        self
    }

    /// Appends a `subcommand-group` option and the group's commands,
    /// renamed to `"<group> <name>"`.
    pub fn add_subcommand_group(mut self, group: SubcommandGroup<C, E>) -> Self {
        let subcommand_options = group
            .commands
            .iter()
            .map(Command::as_subcommand_option)
            .collect();
        self.options.push(CommandOption::subcommand_group(
            group.name.clone(),
            group.description,
            subcommand_options,
        ));

        let group_name = group.name.default_value();
        for mut command in group.commands {
            let composite = format!("{} {}", group_name, command.name.default_value());
            command.name.set_default(composite);
            self.subcommands.push(command);
        }
        self
    }

    fn as_subcommand_option(&self) -> CommandOption {
        CommandOption::subcommand(
            self.name.clone(),
            self.description.clone(),
            self.options.clone(),
        )
    }

    /// Calls the handler for `kind`; a missing handler is a no-op.
    pub async fn invoke(&self, kind: InteractionKind, ctx: C, event: E) -> HandlerResult {
        match self.handlers.get(&kind) {
            Some(handler) => handler(ctx, event).await,
            None => Ok(()),
        }
    }

    /// Runs the permission predicate, treating errors as a denial.
    pub async fn check_permission(&self, ctx: C, event: E) -> bool {
        match (self.permission)(ctx, event).await {
            Ok(allowed) => allowed,
            Err(e) => {
                debug!(
                    "Permission check for '{}' failed, denying: {}",
                    self.default_name(),
                    e
                );
                false
            }
        }
    }
}

impl<C, E> Command<C, E> {
    pub fn name(&self) -> &LocalizedString {
        &self.name
    }

    pub fn default_name(&self) -> &str {
        self.name.default_value()
    }

    pub fn description(&self) -> &LocalizedString {
        &self.description
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    pub fn subcommands(&self) -> &[Command<C, E>] {
        &self.subcommands
    }

    /// Finds a flattened subcommand by its exact default name.
    pub fn find_subcommand(&self, composite_name: &str) -> Option<&Command<C, E>> {
        self.subcommands
            .iter()
            .find(|command| command.default_name() == composite_name)
    }

    pub fn owners_only(&self) -> bool {
        self.owners_only
    }

    pub fn nsfw(&self) -> bool {
        self.nsfw
    }

    pub fn integration_types(&self) -> &[IntegrationType] {
        &self.integration_types
    }

    pub fn contexts(&self) -> &[InteractionContext] {
        &self.contexts
    }

    pub fn has_handler(&self, kind: InteractionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Whether the command is registered globally rather than per guild.
    pub fn is_global_scope(&self) -> bool {
        self.integration_types.contains(&IntegrationType::UserInstall)
            || self.contexts.contains(&InteractionContext::BotDm)
            || self.contexts.contains(&InteractionContext::PrivateChannel)
    }

    pub fn to_wire_format(&self) -> CommandPayload {
        let options = (self.kind == CommandKind::ChatInput && !self.options.is_empty())
            .then(|| self.options.clone());

        CommandPayload {
            kind: self.kind,
            name: self.name.default_value().to_string(),
            name_localizations: self.name.localizations(),
            description: self.description.default_value().to_string(),
            description_localizations: self.description.localizations(),
            options,
            nsfw: self.nsfw.then_some(true),
            integration_types: sorted_or_none(&self.integration_types),
            contexts: sorted_or_none(&self.contexts),
        }
    }
}

fn allow_all<C: 'static, E: 'static>() -> PermissionCheck<C, E> {
    Arc::new(|_: C, _: E| -> BoxFuture<'static, Result<bool, BoxError>> {
        Box::pin(async { Ok(true) })
    })
}

fn sorted_or_none<T: Ord + Copy>(values: &[T]) -> Option<Vec<T>> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    Some(sorted)
}

impl<C, E> std::fmt::Debug for Command<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().copied().collect();
        handlers.sort_unstable();

        f.debug_struct("Command")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("options", &self.options.len())
            .field("subcommands", &self.subcommands)
            .field("handlers", &handlers)
            .field("owners_only", &self.owners_only)
            .finish_non_exhaustive()
    }
}
