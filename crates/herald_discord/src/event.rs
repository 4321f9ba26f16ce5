use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{BoxError, InteractionEvent, InteractionKind, Snowflake};
use serenity::all::{
    CommandData, CommandDataOptionValue, CommandInteraction, CommandType, ComponentInteraction,
    ComponentInteractionDataKind, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, Interaction, InteractionType,
    ModalInteraction, User,
};

/// A serenity interaction as seen by the router.
///
/// Cheap to clone; the interaction and its client context are shared.
#[derive(Clone)]
pub struct DiscordEvent {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: Context,
    interaction: Interaction,
    kind: InteractionKind,
    group: Option<String>,
    subcommand: Option<String>,
}

impl DiscordEvent {
    /// Wraps `interaction`, or `None` for interaction types no command
    /// can handle (pings, unknown component kinds).
    pub fn new(ctx: Context, interaction: Interaction) -> Option<Self> {
        let kind = kind_of(&interaction)?;
        let (group, subcommand) = match &interaction {
            Interaction::Command(command) | Interaction::Autocomplete(command) => {
                selectors(&command.data)
            }
            _ => (None, None),
        };

        Some(Self {
            inner: Arc::new(Inner {
                ctx,
                interaction,
                kind,
                group,
                subcommand,
            }),
        })
    }

    pub fn context(&self) -> &Context {
        &self.inner.ctx
    }

    pub fn interaction(&self) -> &Interaction {
        &self.inner.interaction
    }

    /// The command or context-menu interaction, for those kinds.
    pub fn as_command(&self) -> Option<&CommandInteraction> {
        match &self.inner.interaction {
            Interaction::Command(command) => Some(command),
            _ => None,
        }
    }

    pub fn as_autocomplete(&self) -> Option<&CommandInteraction> {
        match &self.inner.interaction {
            Interaction::Autocomplete(command) => Some(command),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentInteraction> {
        match &self.inner.interaction {
            Interaction::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_modal(&self) -> Option<&ModalInteraction> {
        match &self.inner.interaction {
            Interaction::Modal(modal) => Some(modal),
            _ => None,
        }
    }

    fn user(&self) -> Option<&User> {
        match &self.inner.interaction {
            Interaction::Command(command) | Interaction::Autocomplete(command) => {
                Some(&command.user)
            }
            Interaction::Component(component) => Some(&component.user),
            Interaction::Modal(modal) => Some(&modal.user),
            _ => None,
        }
    }
}

fn kind_of(interaction: &Interaction) -> Option<InteractionKind> {
    match interaction {
        Interaction::Command(command) => match command.data.kind {
            CommandType::ChatInput => Some(InteractionKind::ChatInput),
            CommandType::User => Some(InteractionKind::UserContextMenu),
            CommandType::Message => Some(InteractionKind::MessageContextMenu),
            _ => None,
        },
        Interaction::Autocomplete(_) => Some(InteractionKind::Autocomplete),
        Interaction::Component(component) => match component.data.kind {
            ComponentInteractionDataKind::Button => Some(InteractionKind::Button),
            ComponentInteractionDataKind::StringSelect { .. }
            | ComponentInteractionDataKind::UserSelect { .. }
            | ComponentInteractionDataKind::RoleSelect { .. }
            | ComponentInteractionDataKind::MentionableSelect { .. }
            | ComponentInteractionDataKind::ChannelSelect { .. } => {
                Some(InteractionKind::SelectMenu)
            }
            _ => None,
        },
        Interaction::Modal(_) => Some(InteractionKind::ModalSubmit),
        _ => None,
    }
}

/// A message's interaction name, kept only when that interaction was a
/// command. Replies to components and modals route by custom id instead.
fn command_origin(kind: InteractionType, name: &str) -> Option<&str> {
    (kind == InteractionType::Command).then_some(name)
}

/// The group and subcommand selected in a command payload, if any.
fn selectors(data: &CommandData) -> (Option<String>, Option<String>) {
    let Some(first) = data.options.first() else {
        return (None, None);
    };
    match &first.value {
        CommandDataOptionValue::SubCommandGroup(options) => (
            Some(first.name.clone()),
            options.first().map(|sub| sub.name.clone()),
        ),
        CommandDataOptionValue::SubCommand(_) => (None, Some(first.name.clone())),
        _ => (None, None),
    }
}

#[async_trait]
impl InteractionEvent for DiscordEvent {
    fn kind(&self) -> InteractionKind {
        self.inner.kind
    }

    fn user_id(&self) -> Snowflake {
        self.user().map(|user| user.id.get()).unwrap_or_default()
    }

    fn user_name(&self) -> &str {
        self.user().map(|user| user.name.as_str()).unwrap_or_default()
    }

    fn command_name(&self) -> Option<&str> {
        match &self.inner.interaction {
            Interaction::Command(command) | Interaction::Autocomplete(command) => {
                Some(command.data.name.as_str())
            }
            _ => None,
        }
    }

    fn subcommand_group(&self) -> Option<&str> {
        self.inner.group.as_deref()
    }

    fn subcommand(&self) -> Option<&str> {
        self.inner.subcommand.as_deref()
    }

    fn custom_id(&self) -> Option<&str> {
        match &self.inner.interaction {
            Interaction::Component(component) => Some(component.data.custom_id.as_str()),
            Interaction::Modal(modal) => Some(modal.data.custom_id.as_str()),
            _ => None,
        }
    }

    #[allow(deprecated)]
    fn origin_command_name(&self) -> Option<&str> {
        let origin = self.as_component()?.message.interaction.as_ref()?;
        command_origin(origin.kind, &origin.name)
    }

    fn is_repliable(&self) -> bool {
        !matches!(
            self.inner.interaction,
            Interaction::Autocomplete(_) | Interaction::Ping(_)
        )
    }

    async fn reply_failure(&self, content: &str) -> Result<(), BoxError> {
        let http = &self.inner.ctx.http;
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true),
        );
        let created = match &self.inner.interaction {
            Interaction::Command(command) => command.create_response(http, response).await,
            Interaction::Component(component) => component.create_response(http, response).await,
            Interaction::Modal(modal) => modal.create_response(http, response).await,
            _ => return Ok(()),
        };
        if created.is_ok() {
            return Ok(());
        }

        // Already acknowledged by the handler; replace what it sent.
        let edit = EditInteractionResponse::new().content(content);
        match &self.inner.interaction {
            Interaction::Command(command) => command.edit_response(http, edit).await?,
            Interaction::Component(component) => component.edit_response(http, edit).await?,
            Interaction::Modal(modal) => modal.edit_response(http, edit).await?,
            _ => return Ok(()),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_only_from_commands() {
        assert_eq!(
            command_origin(InteractionType::Command, "sub group1 foo"),
            Some("sub group1 foo")
        );
        assert_eq!(command_origin(InteractionType::Component, "ah"), None);
        assert_eq!(command_origin(InteractionType::Modal, "form"), None);
    }
}
