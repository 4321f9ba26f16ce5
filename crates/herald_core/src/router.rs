//! Resolves interactions to commands and runs their handlers.
//!
//! Each interaction is resolved on its own; nothing is kept between
//! events. Resolution yields the top-level command and, when the event
//! selects one, a flattened subcommand:
//!
//! - command, context menu and autocomplete events name the command
//!   directly; a subcommand selector that matches nothing is ignored;
//! - components on a message sent in reply to a command recover the
//!   command from that message's interaction metadata;
//! - other components and modals are routed by their custom identifier,
//!   see [`parse_custom_id`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::DispatchError;
use crate::event::{InteractionEvent, InteractionKind};
use crate::option::OptionKind;
use crate::set::{CommandSet, Owners};

/// Reply used when a handler panics.
pub const GENERIC_FAILURE: &str = "An error occurred while executing the command.";

/// A resolved command and, optionally, the subcommand selected under it.
pub struct CommandPath<'a, C, E> {
    pub top: &'a Command<C, E>,
    pub sub: Option<&'a Command<C, E>>,
}

impl<C, E> CommandPath<'_, C, E> {
    /// Default names, top-level first.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.top.default_name())
            .chain(self.sub.map(Command::default_name))
            .collect()
    }
}

/// Command path encoded in a component or modal custom identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomIdPath<'a> {
    pub command: String,
    pub subcommand: Option<String>,
    pub discriminator: Option<&'a str>,
}

/// Splits `id` on `-`. The last segment is a free-form discriminator and
/// is not part of the path; the first remaining segment names the
/// top-level command and the rest, joined with spaces, the subcommand.
pub fn parse_custom_id(id: &str) -> CustomIdPath<'_> {
    let mut segments: Vec<&str> = id.split('-').collect();
    let discriminator = if segments.len() > 1 {
        segments.pop()
    } else {
        segments.clear();
        None
    };

    let command = segments.first().copied().unwrap_or_default().to_string();
    let rest = segments.get(1..).unwrap_or_default();
    let subcommand = (!rest.is_empty()).then(|| rest.join(" "));

    CustomIdPath {
        command,
        subcommand,
        discriminator,
    }
}

/// Builds a custom identifier that [`parse_custom_id`] routes back to `path`.
pub fn custom_id(path: &[&str], discriminator: &str) -> String {
    let mut id = path.join("-");
    id.push('-');
    id.push_str(discriminator);
    id
}

/// Routes interactions to the commands of one bot.
pub struct Router<C, E> {
    commands: Arc<CommandSet<C, E>>,
    owners: Owners,
}

impl<C, E> Router<C, E> {
    pub fn new(commands: Arc<CommandSet<C, E>>, owners: Owners) -> Self {
        Self { commands, owners }
    }

    pub fn commands(&self) -> &CommandSet<C, E> {
        &self.commands
    }

    pub fn owners(&self) -> &Owners {
        &self.owners
    }

    fn find(&self, name: &str) -> Result<&Command<C, E>, DispatchError> {
        self.commands
            .get(name)
            .map(|command| command.as_ref())
            .ok_or_else(|| DispatchError::not_found(name))
    }
}

impl<C, E> Router<C, E>
where
    C: Clone + Send + Sync + 'static,
    E: InteractionEvent + Clone + 'static,
{
    /// Finds the command (and subcommand) an event belongs to. `Ok(None)`
    /// means the event carried no command-shaped data at all.
    pub fn resolve(&self, event: &E) -> Result<Option<CommandPath<'_, C, E>>, DispatchError> {
        let kind = event.kind();

        if kind.names_command() {
            let name = event.command_name().unwrap_or_default();
            let top = self.find(name)?;
            let sub = if kind.carries_subcommand() {
                resolve_selector(top, event.subcommand_group(), event.subcommand())
            } else {
                None
            };
            return Ok(Some(CommandPath { top, sub }));
        }

        if kind.is_component() {
            if let Some(origin) = event.origin_command_name() {
                return self.resolve_origin(origin).map(Some);
            }
        }

        match event.custom_id() {
            Some(id) => self.resolve_custom_id(id).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves a command name recorded on a message, e.g. `"sub group1 foo"`.
    fn resolve_origin(&self, origin: &str) -> Result<CommandPath<'_, C, E>, DispatchError> {
        if let Ok(top) = self.find(origin) {
            return Ok(CommandPath { top, sub: None });
        }

        let mut parts = origin.split(' ');
        let parent = parts.next().unwrap_or_default();
        let path: Vec<&str> = parts.collect();

        let top = self
            .find(parent)
            .map_err(|_| DispatchError::not_found(origin))?;
        if path.is_empty() {
            return Ok(CommandPath { top, sub: None });
        }

        let sub = top
            .options()
            .iter()
            .filter(|option| option.kind.is_subcommand_like())
            .filter(|option| option.default_name() == path[0])
            .find_map(|option| match (option.kind, path.as_slice()) {
                (OptionKind::SubcommandGroup, [_, inner]) => {
                    let member = option
                        .options
                        .iter()
                        .find(|candidate| candidate.default_name() == *inner)?;
                    top.find_subcommand(&format!(
                        "{} {}",
                        option.default_name(),
                        member.default_name()
                    ))
                }
                (OptionKind::Subcommand, [_]) => top.find_subcommand(option.default_name()),
                _ => None,
            })
            .ok_or_else(|| DispatchError::not_found(origin))?;

        Ok(CommandPath {
            top,
            sub: Some(sub),
        })
    }

    fn resolve_custom_id(&self, id: &str) -> Result<CommandPath<'_, C, E>, DispatchError> {
        let parsed = parse_custom_id(id);
        let top = self.find(&parsed.command)?;
        let sub = parsed
            .subcommand
            .as_deref()
            .and_then(|name| top.find_subcommand(name));

        Ok(CommandPath { top, sub })
    }

    /// Owners always pass; owners-only commands stop everyone else; then
    /// the command's own predicate decides.
    async fn authorize(&self, command: &Command<C, E>, ctx: C, event: &E) -> bool {
        let passed = if self.owners.contains(event.user_id()) {
            true
        } else if command.owners_only() {
            false
        } else {
            command.check_permission(ctx, event.clone()).await
        };

        info!(
            "{} [{}] using {} -> {}",
            event.user_name(),
            event.user_id(),
            command.default_name(),
            if passed { "passed" } else { "failed" }
        );
        passed
    }

    /// Resolves, authorizes and runs the handlers for `kind`.
    ///
    /// When a subcommand resolved, its handler runs first and the
    /// top-level handler for the same kind runs after it.
    pub async fn handle(&self, kind: InteractionKind, ctx: C, event: E) -> Result<(), DispatchError> {
        let Some(path) = self.resolve(&event)? else {
            debug!("{} interaction carried no command", kind);
            return Ok(());
        };

        if !self.authorize(path.top, ctx.clone(), &event).await {
            return Err(DispatchError::denied(
                path.top.default_name(),
                event.user_id(),
            ));
        }

        if let Some(sub) = path.sub {
            if !self.authorize(sub, ctx.clone(), &event).await {
                return Err(DispatchError::denied(sub.default_name(), event.user_id()));
            }
            sub.invoke(kind, ctx.clone(), event.clone())
                .await
                .map_err(|cause| handler_failed(sub, kind, cause))?;
        }

        path.top
            .invoke(kind, ctx, event)
            .await
            .map_err(|cause| handler_failed(path.top, kind, cause))
    }

    /// Entry point for the event listener. Never fails: errors and panics
    /// are logged and, when possible, reported back to the user.
    pub async fn dispatch(&self, ctx: C, event: E) {
        let kind = event.kind();
        let outcome = AssertUnwindSafe(self.handle(kind, ctx, event.clone()))
            .catch_unwind()
            .await;

        let message = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => {
                error!("Failed to handle {} interaction: {}", kind, e);
                e.user_message()
            }
            Err(_) => {
                error!("Handler panicked while handling {} interaction", kind);
                GENERIC_FAILURE.to_string()
            }
        };

        if event.is_repliable() {
            if let Err(e) = event.reply_failure(&message).await {
                warn!("Could not report failure to {}: {}", event.user_id(), e);
            }
        }
    }
}

fn resolve_selector<'a, C, E>(
    top: &'a Command<C, E>,
    group: Option<&str>,
    sub: Option<&str>,
) -> Option<&'a Command<C, E>> {
    let composite = match (group, sub) {
        (Some(group), Some(sub)) => format!("{group} {sub}"),
        (None, Some(sub)) => sub.to_string(),
        _ => return None,
    };

    let found = top.find_subcommand(&composite);
    if found.is_none() {
        debug!(
            "No subcommand '{}' under '{}', using the top-level command",
            composite,
            top.default_name()
        );
    }
    found
}

fn handler_failed<C, E>(
    command: &Command<C, E>,
    kind: InteractionKind,
    cause: crate::error::BoxError,
) -> DispatchError {
    DispatchError::HandlerFailed {
        command: command.default_name().to_string(),
        kind: kind.to_string(),
        cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandInfo, SubcommandGroup};
    use crate::error::BoxError;
    use crate::option::{CommandOption, OptionKind};
    use crate::payload::CommandKind;
    use crate::test_helpers::{CallLog, FakeEvent};

    type TestCommand = Command<CallLog, FakeEvent>;

    const OWNER: u64 = 1;
    const MEMBER: u64 = 2;

    fn recording(name: &str) -> TestCommand {
        let tag = name.to_string();
        TestCommand::create(CommandInfo::chat_input(name, format!("{name} command")))
            .unwrap()
            .add_handler(InteractionKind::ChatInput, {
                let tag = tag.clone();
                move |log: CallLog, _| {
                    let tag = tag.clone();
                    async move {
                        log.push(format!("chat:{tag}"));
                        Ok(())
                    }
                }
            })
            .add_handler(InteractionKind::Button, move |log: CallLog, _| {
                let tag = tag.clone();
                async move {
                    log.push(format!("button:{tag}"));
                    Ok(())
                }
            })
    }

    fn router(commands: Vec<TestCommand>) -> Router<CallLog, FakeEvent> {
        let mut set = CommandSet::new();
        set.register(commands);
        Router::new(Arc::new(set), Owners::single(OWNER))
    }

    fn grouped() -> TestCommand {
        recording("top")
            .add_subcommand_group(SubcommandGroup::new("g", "a group", vec![recording("c")]))
            .add_subcommands(vec![recording("plain")])
    }

    #[test]
    fn test_parse_custom_id() {
        let parsed = parse_custom_id("top-g c-xyz");
        assert_eq!(parsed.command, "top");
        assert_eq!(parsed.subcommand.as_deref(), Some("g c"));
        assert_eq!(parsed.discriminator, Some("xyz"));

        let parsed = parse_custom_id("top-g-c-1");
        assert_eq!(parsed.subcommand.as_deref(), Some("g c"));

        let parsed = parse_custom_id("context action-test");
        assert_eq!(parsed.command, "context action");
        assert_eq!(parsed.subcommand, None);

        assert_eq!(parse_custom_id("random").command, "");
    }

    #[test]
    fn test_custom_id_builder_matches_parser() {
        let id = custom_id(&["top", "g c"], "7");
        assert_eq!(id, "top-g c-7");

        let parsed = parse_custom_id(&id);
        assert_eq!(parsed.command, "top");
        assert_eq!(parsed.subcommand.as_deref(), Some("g c"));
        assert_eq!(parsed.discriminator, Some("7"));
    }

    #[test]
    fn test_resolve_composite_name_from_chat_input() {
        let router = router(vec![grouped()]);
        let event = FakeEvent::chat(MEMBER, "top").with_subcommand(Some("g"), "c");

        let path = router.resolve(&event).unwrap().unwrap();
        assert_eq!(path.names(), vec!["top", "g c"]);
    }

    #[test]
    fn test_resolve_custom_id_path() {
        let router = router(vec![grouped()]);
        let event = FakeEvent::button(MEMBER, "top-g c-xyz");

        let path = router.resolve(&event).unwrap().unwrap();
        assert_eq!(path.names(), vec!["top", "g c"]);
    }

    #[test]
    fn test_unknown_subcommand_falls_back_to_top() {
        let router = router(vec![grouped()]);
        let event = FakeEvent::chat(MEMBER, "top").with_subcommand(None, "missing");

        let path = router.resolve(&event).unwrap().unwrap();
        assert_eq!(path.names(), vec!["top"]);

        let event = FakeEvent::modal(MEMBER, "top-missing-1");
        assert_eq!(router.resolve(&event).unwrap().unwrap().names().len(), 1);
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let router = router(vec![grouped()]);

        let err = router
            .resolve(&FakeEvent::chat(MEMBER, "nope"))
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::CommandNotFound { name } if name == "nope"));

        let err = router
            .resolve(&FakeEvent::button(MEMBER, "nope-1"))
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::CommandNotFound { .. }));
    }

    #[test]
    fn test_resolve_from_origin_message() {
        let router = router(vec![grouped()]);

        let direct = FakeEvent::button(MEMBER, "ah").with_origin("top");
        assert_eq!(router.resolve(&direct).unwrap().unwrap().names(), vec!["top"]);

        let grouped = FakeEvent::button(MEMBER, "ah").with_origin("top g c");
        assert_eq!(
            router.resolve(&grouped).unwrap().unwrap().names(),
            vec!["top", "g c"]
        );

        let plain = FakeEvent::button(MEMBER, "ah").with_origin("top plain");
        assert_eq!(
            router.resolve(&plain).unwrap().unwrap().names(),
            vec!["top", "plain"]
        );

        let missing = FakeEvent::button(MEMBER, "ah").with_origin("top g nope");
        assert!(router.resolve(&missing).is_err());

        let no_parent = FakeEvent::button(MEMBER, "ah").with_origin("gone g c");
        assert!(router.resolve(&no_parent).is_err());
    }

    #[test]
    fn test_origin_with_extra_segments_is_not_found() {
        let router = router(vec![grouped()]);

        let plain = FakeEvent::button(MEMBER, "ah").with_origin("top plain extra");
        let err = router.resolve(&plain).err().unwrap();
        assert!(matches!(err, DispatchError::CommandNotFound { name } if name == "top plain extra"));

        let grouped = FakeEvent::button(MEMBER, "ah").with_origin("top g c extra");
        assert!(router.resolve(&grouped).is_err());

        let bare_group = FakeEvent::button(MEMBER, "ah").with_origin("top g");
        assert!(router.resolve(&bare_group).is_err());
    }

    #[test]
    fn test_origin_takes_precedence_over_custom_id() {
        let router = router(vec![grouped(), recording("other")]);

        let with_origin = FakeEvent::button(MEMBER, "other-1").with_origin("top plain");
        assert_eq!(
            router.resolve(&with_origin).unwrap().unwrap().names(),
            vec!["top", "plain"]
        );

        // Events whose message did not come from a command report no origin.
        let without_origin = FakeEvent::button(MEMBER, "top-g c-xyz");
        assert_eq!(
            router.resolve(&without_origin).unwrap().unwrap().names(),
            vec!["top", "g c"]
        );
    }

    #[test]
    fn test_context_menu_ignores_subcommands() {
        let menu = TestCommand::create(
            CommandInfo::new("context action").kind(CommandKind::Message),
        )
        .unwrap();
        let router = router(vec![menu]);

        let event = FakeEvent::new(InteractionKind::MessageContextMenu, MEMBER)
            .with_command("context action")
            .with_subcommand(None, "ignored");
        assert_eq!(router.resolve(&event).unwrap().unwrap().names().len(), 1);
    }

    #[tokio::test]
    async fn test_subcommand_then_top_handler() {
        let router = router(vec![grouped()]);
        let log = CallLog::default();
        let event = FakeEvent::chat(MEMBER, "top").with_subcommand(Some("g"), "c");

        router
            .handle(InteractionKind::ChatInput, log.clone(), event)
            .await
            .unwrap();

        assert_eq!(log.entries(), vec!["chat:c", "chat:top"]);
    }

    #[tokio::test]
    async fn test_missing_handler_is_noop() {
        let router = router(vec![grouped()]);
        let log = CallLog::default();
        let event = FakeEvent::new(InteractionKind::SelectMenu, MEMBER).with_custom_id("top-1");

        router
            .handle(InteractionKind::SelectMenu, log.clone(), event)
            .await
            .unwrap();
        assert!(log.entries().is_empty());
    }

    fn locked() -> TestCommand {
        TestCommand::create(CommandInfo::chat_input("eval", "owners only").owners_only(true))
            .unwrap()
            .set_permission(|_, _| async { Ok::<bool, BoxError>(false) })
            .add_handler(InteractionKind::ChatInput, |log: CallLog, _| async move {
                log.push("eval");
                Ok(())
            })
    }

    #[tokio::test]
    async fn test_owner_bypasses_owners_only_and_predicate() {
        let router = router(vec![locked()]);
        let log = CallLog::default();

        router
            .handle(
                InteractionKind::ChatInput,
                log.clone(),
                FakeEvent::chat(OWNER, "eval"),
            )
            .await
            .unwrap();
        assert_eq!(log.entries(), vec!["eval"]);
    }

    #[tokio::test]
    async fn test_non_owner_denied_before_handler() {
        let router = router(vec![locked()]);
        let log = CallLog::default();

        let err = router
            .handle(
                InteractionKind::ChatInput,
                log.clone(),
                FakeEvent::chat(MEMBER, "eval"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::PermissionDenied { .. }));
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_subcommand_denial_stops_both_handlers() {
        let sub = recording("secret").set_permission(|_, _| async { Ok::<bool, BoxError>(false) });
        let router = router(vec![recording("top").add_subcommands(vec![sub])]);
        let log = CallLog::default();

        let event = FakeEvent::chat(MEMBER, "top").with_subcommand(None, "secret");
        let err = router
            .handle(InteractionKind::ChatInput, log.clone(), event)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::PermissionDenied { command, .. } if command == "secret"));
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_replies_on_failure() {
        let failing = TestCommand::create(CommandInfo::chat_input("boom", "fails"))
            .unwrap()
            .add_handler(InteractionKind::ChatInput, |_, _| async {
                Err::<(), BoxError>("database unavailable".into())
            });
        let router = router(vec![failing]);

        let event = FakeEvent::chat(MEMBER, "boom");
        router.dispatch(CallLog::default(), event.clone()).await;
        assert_eq!(event.replies(), vec!["database unavailable"]);

        let event = FakeEvent::chat(MEMBER, "unknown");
        router.dispatch(CallLog::default(), event.clone()).await;
        assert_eq!(event.replies(), vec!["Command not found."]);
    }

    #[tokio::test]
    async fn test_dispatch_survives_panicking_handler() {
        let panicking = TestCommand::create(CommandInfo::chat_input("panic", "panics"))
            .unwrap()
            .add_handler(InteractionKind::ChatInput, |_, _| async {
                let pages: Vec<u32> = Vec::new();
                let _first = pages[0];
                Ok(())
            });
        let router = router(vec![panicking]);

        let event = FakeEvent::chat(MEMBER, "panic");
        router.dispatch(CallLog::default(), event.clone()).await;
        assert_eq!(event.replies(), vec![GENERIC_FAILURE]);
    }

    #[tokio::test]
    async fn test_dispatch_skips_reply_when_not_repliable() {
        let router = router(vec![]);
        let event = FakeEvent::new(InteractionKind::Autocomplete, MEMBER).with_command("gone");

        router.dispatch(CallLog::default(), event.clone()).await;
        assert!(event.replies().is_empty());
    }

    #[test]
    fn test_option_lookup_uses_declared_structure() {
        let top = grouped();
        let group = top
            .options()
            .iter()
            .find(|option| option.kind == OptionKind::SubcommandGroup)
            .unwrap();
        let member: &CommandOption = &group.options[0];
        assert_eq!(member.default_name(), "c");
    }
}
