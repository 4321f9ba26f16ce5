//! Commands every bot can register as-is.

use std::time::Instant;

use herald_core::{CommandInfo, CommandOption, OptionKind, ValidationError};
use serenity::all::{
    CommandDataOptionValue, CommandInteraction, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse,
};

use crate::bot::BotContext;
use crate::handlers::{BotCommand, TypedHandlers};

/// Replies with the value of its required `string` option.
pub fn echo() -> Result<BotCommand, ValidationError> {
    let info = CommandInfo::chat_input("echo", "send back what the user sent").option(
        CommandOption::new(
            OptionKind::String,
            "string",
            "the string you want sent back to you",
        )
        .required(true),
    );

    Ok(BotCommand::create(info)?.on_chat_input(|_bot, ctx, int| async move {
        let text = string_option(&int, "string").unwrap_or_default().to_string();
        int.create_response(
            &ctx.http,
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(text)),
        )
        .await?;
        Ok(())
    }))
}

/// Defers, then reports how long the acknowledgement took.
pub fn ping() -> Result<BotCommand, ValidationError> {
    let info = CommandInfo::chat_input("ping", "Pong!");

    Ok(BotCommand::create(info)?.on_chat_input(|bot, ctx, int| async move {
        let started = Instant::now();
        int.defer(&ctx.http).await?;
        let latency = started.elapsed().as_millis();

        int.edit_response(
            &ctx.http,
            EditInteractionResponse::new().content(pong(&bot, latency)),
        )
        .await?;
        Ok(())
    }))
}

pub fn all() -> Result<Vec<BotCommand>, ValidationError> {
    Ok(vec![echo()?, ping()?])
}

fn pong(bot: &BotContext, latency: u128) -> String {
    let mut lines = vec!["### 🏓 Pong!".to_string(), format!("## {}ms", latency)];
    if let Some(shard) = bot.shard_id() {
        lines.push(format!("-# via shard #{}", shard));
    }
    lines.join("\n")
}

/// A top-level string option's value.
pub fn string_option<'a>(int: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    int.data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| match &option.value {
            CommandDataOptionValue::String(value) => Some(value.as_str()),
            _ => None,
        })
}
