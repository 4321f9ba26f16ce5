//! Per-kind handler helpers that hand each handler serenity's concrete
//! interaction type instead of the generic event.

use std::future::Future;
use std::sync::Arc;

use herald_core::{Command, HandlerResult, InteractionKind};
use serenity::all::{CommandInteraction, ComponentInteraction, Context, ModalInteraction};

use crate::bot::BotContext;
use crate::error::DiscordError;
use crate::event::DiscordEvent;

/// A command whose handlers run against the live bot.
pub type BotCommand = Command<Arc<BotContext>, DiscordEvent>;

pub trait TypedHandlers: Sized {
    fn on_chat_input<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;

    fn on_user_context_menu<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;

    fn on_message_context_menu<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;

    fn on_autocomplete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;

    fn on_button<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, ComponentInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;

    fn on_select_menu<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, ComponentInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;

    fn on_modal_submit<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, ModalInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static;
}

impl TypedHandlers for BotCommand {
    fn on_chat_input<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(self, InteractionKind::ChatInput, DiscordEvent::as_command, handler)
    }

    fn on_user_context_menu<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(
            self,
            InteractionKind::UserContextMenu,
            DiscordEvent::as_command,
            handler,
        )
    }

    fn on_message_context_menu<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(
            self,
            InteractionKind::MessageContextMenu,
            DiscordEvent::as_command,
            handler,
        )
    }

    fn on_autocomplete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, CommandInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(
            self,
            InteractionKind::Autocomplete,
            DiscordEvent::as_autocomplete,
            handler,
        )
    }

    fn on_button<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, ComponentInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(self, InteractionKind::Button, DiscordEvent::as_component, handler)
    }

    fn on_select_menu<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, ComponentInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(
            self,
            InteractionKind::SelectMenu,
            DiscordEvent::as_component,
            handler,
        )
    }

    fn on_modal_submit<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<BotContext>, Context, ModalInteraction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        typed(self, InteractionKind::ModalSubmit, DiscordEvent::as_modal, handler)
    }
}

fn typed<T, F, Fut>(
    command: BotCommand,
    kind: InteractionKind,
    extract: fn(&DiscordEvent) -> Option<&T>,
    handler: F,
) -> BotCommand
where
    T: Clone + Send + 'static,
    F: Fn(Arc<BotContext>, Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let handler = Arc::new(handler);
    command.add_handler(kind, move |bot: Arc<BotContext>, event: DiscordEvent| {
        let handler = handler.clone();
        let interaction = extract(&event).cloned();
        let ctx = event.context().clone();
        async move {
            let interaction =
                interaction.ok_or(DiscordError::InteractionMismatch { expected: kind })?;
            handler(bot, ctx, interaction).await
        }
    })
}
