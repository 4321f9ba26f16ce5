//! The demo command set exercised by `herald run`.

use herald_core::{
    CommandInfo, CommandKind, CommandOption, LocalizedString, OptionKind, SubcommandGroup,
    ValidationError, custom_id,
};
use herald_discord::builtin::{self, string_option};
use herald_discord::serenity::all::{
    AutocompleteChoice, ButtonStyle, CreateActionRow, CreateAutocompleteResponse, CreateButton,
    CreateInteractionResponse, CreateInteractionResponseMessage,
};
use herald_discord::{BotCommand, TypedHandlers};

/// Autocomplete choices are capped by the platform.
const MAX_CHOICES: usize = 25;

fn message(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(content))
}

/// Autocomplete offering each character of the query.
fn ac() -> Result<BotCommand, ValidationError> {
    let info = CommandInfo::chat_input("ac", "ac test").option(
        CommandOption::new(OptionKind::String, "query", "query")
            .required(true)
            .autocomplete(true),
    );

    Ok(BotCommand::create(info)?
        .on_autocomplete(|_bot, ctx, int| async move {
            let query = int
                .data
                .autocomplete()
                .map(|focused| focused.value.to_string())
                .unwrap_or_default();
            let choices = query
                .chars()
                .take(MAX_CHOICES)
                .map(|c| AutocompleteChoice::new(format!("{} - {}", c.to_uppercase(), c), c.to_string()))
                .collect();
            int.create_response(
                &ctx.http,
                CreateInteractionResponse::Autocomplete(
                    CreateAutocompleteResponse::new().set_choices(choices),
                ),
            )
            .await?;
            Ok(())
        })
        .on_chat_input(|_bot, ctx, int| async move {
            let query = string_option(&int, "query").unwrap_or_default().to_string();
            int.create_response(&ctx.http, message(query)).await?;
            Ok(())
        }))
}

/// Message context menu that answers with a button routed by custom id.
fn context_action() -> Result<BotCommand, ValidationError> {
    let info = CommandInfo::new("context action").kind(CommandKind::Message);

    Ok(BotCommand::create(info)?
        .on_button(|_bot, ctx, int| async move {
            int.create_response(&ctx.http, message(int.data.custom_id.clone()))
                .await?;
            Ok(())
        })
        .on_message_context_menu(|_bot, ctx, int| async move {
            let summary = match int.data.resolved.messages.values().next() {
                Some(target) => format!(
                    "```\nid: {}\nauthor: {}\ncontent: {}\n```",
                    target.id, target.author.name, target.content
                ),
                None => "No target message".to_string(),
            };
            let button = CreateButton::new(custom_id(&["context action"], "test"))
                .label("Test")
                .style(ButtonStyle::Primary);
            int.create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(summary)
                        .components(vec![CreateActionRow::Buttons(vec![button])]),
                ),
            )
            .await?;
            Ok(())
        }))
}

fn locale_test() -> Result<BotCommand, ValidationError> {
    let name = LocalizedString::from_map([("default", "locale_test"), ("ja", "ロケールテスト")])?;
    let description = LocalizedString::from_map([
        ("default", "Locale test command."),
        ("ja", "ロケールのテスト用コマンドです。"),
    ])?;

    Ok(
        BotCommand::create(CommandInfo::new(name).description(description))?.on_chat_input(
            |_bot, ctx, int| async move {
                int.create_response(&ctx.http, message("blah")).await?;
                Ok(())
            },
        ),
    )
}

/// The leaf registered under every branch of `sub`.
fn foo() -> Result<BotCommand, ValidationError> {
    let info = CommandInfo::chat_input("foo", "bar command stuff").option(
        CommandOption::new(OptionKind::String, "foo", "random stuff")
            .required(true)
            .autocomplete(true),
    );

    Ok(BotCommand::create(info)?
        .on_autocomplete(|_bot, ctx, int| async move {
            let choices = ["bar", "bar2", "bar3"]
                .into_iter()
                .map(|value| AutocompleteChoice::new(value, value))
                .collect();
            int.create_response(
                &ctx.http,
                CreateInteractionResponse::Autocomplete(
                    CreateAutocompleteResponse::new().set_choices(choices),
                ),
            )
            .await?;
            Ok(())
        })
        .on_button(|_bot, ctx, int| async move {
            int.create_response(&ctx.http, message(int.data.custom_id.clone()))
                .await?;
            Ok(())
        })
        .on_chat_input(|_bot, ctx, int| async move {
            let button = CreateButton::new("ah")
                .label("blah")
                .style(ButtonStyle::Primary);
            int.create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .components(vec![CreateActionRow::Buttons(vec![button])]),
                ),
            )
            .await?;
            Ok(())
        }))
}

fn sub() -> Result<BotCommand, ValidationError> {
    Ok(
        BotCommand::create(CommandInfo::chat_input("sub", "sub command stuff"))?
            .add_subcommand_group(SubcommandGroup::new("group1", "a group", vec![foo()?]))
            .add_subcommand_group(SubcommandGroup::new("group2", "a group", vec![foo()?]))
            .add_subcommands(vec![foo()?]),
    )
}

/// Built-ins plus the test commands.
pub fn demo() -> Result<Vec<BotCommand>, ValidationError> {
    let mut commands = builtin::all()?;
    commands.extend([ac()?, context_action()?, locale_test()?, sub()?]);
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::InteractionKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_demo_set_names() {
        let names: Vec<String> = demo()
            .unwrap()
            .iter()
            .map(|command| command.default_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["echo", "ping", "ac", "context action", "locale_test", "sub"]
        );
    }

    #[test]
    fn test_sub_flattens_groups() {
        let sub = sub().unwrap();
        let names: Vec<_> = sub.subcommands().iter().map(|c| c.default_name()).collect();
        assert_eq!(names, vec!["group1 foo", "group2 foo", "foo"]);
        assert!(
            sub.find_subcommand("group2 foo")
                .unwrap()
                .has_handler(InteractionKind::Button)
        );
    }

    #[test]
    fn test_locale_test_payload() {
        let payload = serde_json::to_value(locale_test().unwrap().to_wire_format()).unwrap();
        assert_eq!(
            payload,
            json!({
                "type": 1,
                "name": "locale_test",
                "name_localizations": { "ja": "ロケールテスト" },
                "description": "Locale test command.",
                "description_localizations": { "ja": "ロケールのテスト用コマンドです。" },
                "contexts": null
            })
        );
    }

    #[test]
    fn test_context_action_has_no_description() {
        let payload = serde_json::to_value(context_action().unwrap().to_wire_format()).unwrap();
        assert_eq!(
            payload,
            json!({
                "type": 3,
                "name": "context action",
                "description": "",
                "contexts": null
            })
        );
    }
}
