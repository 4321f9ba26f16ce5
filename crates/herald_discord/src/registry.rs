use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{BoxError, CommandPayload, CommandRegistry, RemoteCommand, Scope, Snowflake};
use serenity::all::{Command, CommandId, GuildId, Http};
use tracing::warn;

/// [`CommandRegistry`] over serenity's REST client.
#[derive(Clone)]
pub struct SerenityRegistry {
    http: Arc<Http>,
}

impl SerenityRegistry {
    /// `http` must already carry the application id.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// Converts serenity's command model into the snapshot the differ reads.
///
/// Commands that cannot be represented (new command types) are skipped.
pub fn to_remote(commands: &[Command]) -> Vec<RemoteCommand> {
    commands
        .iter()
        .filter_map(|command| {
            serde_json::to_value(command)
                .and_then(serde_json::from_value)
                .map_err(|e| warn!("Skipping registered command '{}': {}", command.name, e))
                .ok()
        })
        .collect()
}

#[async_trait]
impl CommandRegistry for SerenityRegistry {
    async fn fetch(&self, scope: Scope) -> Result<Vec<RemoteCommand>, BoxError> {
        let commands = match scope {
            Scope::Global => self.http.get_global_commands_with_localizations().await?,
            Scope::Guild(id) => {
                self.http
                    .get_guild_commands_with_localizations(GuildId::new(id))
                    .await?
            }
        };
        Ok(to_remote(&commands))
    }

    async fn bulk_overwrite_global(&self, commands: Vec<CommandPayload>) -> Result<(), BoxError> {
        self.http.create_global_commands(&commands).await?;
        Ok(())
    }

    async fn create(&self, scope: Scope, command: CommandPayload) -> Result<(), BoxError> {
        match scope {
            Scope::Global => {
                self.http.create_global_command(&command).await?;
            }
            Scope::Guild(id) => {
                self.http
                    .create_guild_command(GuildId::new(id), &command)
                    .await?;
            }
        }
        Ok(())
    }

    async fn edit(
        &self,
        scope: Scope,
        id: Snowflake,
        command: CommandPayload,
    ) -> Result<(), BoxError> {
        match scope {
            Scope::Global => {
                self.http
                    .edit_global_command(CommandId::new(id), &command)
                    .await?;
            }
            Scope::Guild(guild) => {
                self.http
                    .edit_guild_command(GuildId::new(guild), CommandId::new(id), &command)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, scope: Scope, id: Snowflake) -> Result<(), BoxError> {
        match scope {
            Scope::Global => self.http.delete_global_command(CommandId::new(id)).await?,
            Scope::Guild(guild) => {
                self.http
                    .delete_guild_command(GuildId::new(guild), CommandId::new(id))
                    .await?
            }
        }
        Ok(())
    }
}
