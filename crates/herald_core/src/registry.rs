//! Remote command registry access.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::error::BoxError;
use crate::event::Snowflake;
use crate::locale::LocalizedString;
use crate::option::{CommandOption, options_eq};
use crate::payload::{CommandKind, CommandPayload, IntegrationType, InteractionContext};

/// Where a command is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Guild(Snowflake),
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Guild(id) => write!(f, "guild {}", id),
        }
    }
}

/// Command as currently registered on the platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCommand {
    #[serde(deserialize_with = "snowflake")]
    pub id: Snowflake,
    #[serde(rename = "type", default)]
    pub kind: CommandKind,
    pub name: String,
    #[serde(default)]
    pub name_localizations: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_localizations: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: Vec<CommandOption>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub nsfw: bool,
    #[serde(default)]
    pub integration_types: Option<Vec<IntegrationType>>,
    #[serde(default)]
    pub contexts: Option<Vec<InteractionContext>>,
}

impl RemoteCommand {
    /// The snapshot the platform would hold after registering `payload`.
    pub fn from_payload(id: Snowflake, payload: &CommandPayload) -> Self {
        Self {
            id,
            kind: payload.kind,
            name: payload.name.clone(),
            name_localizations: payload.name_localizations.clone(),
            description: payload.description.clone(),
            description_localizations: payload.description_localizations.clone(),
            options: payload.options().to_vec(),
            nsfw: payload.nsfw.unwrap_or(false),
            integration_types: payload.integration_types.clone(),
            contexts: payload.contexts.clone(),
        }
    }

    /// The platform's own notion of an unchanged command.
    pub fn matches(&self, local: &CommandPayload) -> bool {
        let remote_name =
            LocalizedString::from_wire(self.name.as_str(), self.name_localizations.as_ref());
        let local_name =
            LocalizedString::from_wire(local.name.as_str(), local.name_localizations.as_ref());
        let remote_description = LocalizedString::from_wire(
            self.description.as_str(),
            self.description_localizations.as_ref(),
        );
        let local_description = LocalizedString::from_wire(
            local.description.as_str(),
            local.description_localizations.as_ref(),
        );

        self.kind == local.kind
            && remote_name == local_name
            && remote_description == local_description
            && self.nsfw == local.nsfw.unwrap_or(false)
            && options_eq(local.options(), &self.options)
    }

    /// `matches` plus order-independent equality of integration types and
    /// contexts, where absent and empty are the same.
    pub fn equivalent_to(&self, local: &CommandPayload) -> bool {
        self.matches(local)
            && set_eq(&self.integration_types, &local.integration_types)
            && set_eq(&self.contexts, &local.contexts)
    }
}

fn set_eq<T: Ord + Copy>(a: &Option<Vec<T>>, b: &Option<Vec<T>>) -> bool {
    let a: BTreeSet<T> = a.iter().flatten().copied().collect();
    let b: BTreeSet<T> = b.iter().flatten().copied().collect();
    a == b
}

fn snowflake<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Snowflake, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(id),
        Raw::Text(id) => id.parse().map_err(serde::de::Error::custom),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CommandOption>, D::Error> {
    Ok(Option::<Vec<CommandOption>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read and write access to the platform's registered commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRegistry: Send + Sync {
    /// Current commands in `scope`, with localizations.
    async fn fetch(&self, scope: Scope) -> Result<Vec<RemoteCommand>, BoxError>;

    /// Replaces the whole global set with `commands`.
    async fn bulk_overwrite_global(&self, commands: Vec<CommandPayload>) -> Result<(), BoxError>;

    async fn create(&self, scope: Scope, command: CommandPayload) -> Result<(), BoxError>;

    async fn edit(
        &self,
        scope: Scope,
        id: Snowflake,
        command: CommandPayload,
    ) -> Result<(), BoxError>;

    async fn delete(&self, scope: Scope, id: Snowflake) -> Result<(), BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(name: &str) -> CommandPayload {
        CommandPayload {
            kind: CommandKind::ChatInput,
            name: name.to_string(),
            name_localizations: None,
            description: format!("{name} command"),
            description_localizations: None,
            options: None,
            nsfw: None,
            integration_types: None,
            contexts: None,
        }
    }

    #[test]
    fn test_parse_remote_snapshot() {
        let remote: RemoteCommand = serde_json::from_value(json!({
            "id": "1180000000000000001",
            "application_id": "99",
            "type": 1,
            "name": "ping",
            "name_localizations": {},
            "description": "ping command",
            "options": [],
            "nsfw": false,
            "integration_types": [0],
            "contexts": null,
            "version": "1"
        }))
        .unwrap();

        assert_eq!(remote.id, 1_180_000_000_000_000_001);
        assert!(remote.matches(&payload("ping")));
        assert!(!remote.equivalent_to(&payload("ping")));
    }

    #[test]
    fn test_empty_localizations_equal_absent() {
        let mut remote = RemoteCommand::from_payload(1, &payload("ping"));
        remote.name_localizations = Some(BTreeMap::new());
        assert!(remote.equivalent_to(&payload("ping")));
    }

    #[test]
    fn test_contexts_compare_as_sets() {
        let mut local = payload("dm");
        local.contexts = Some(vec![InteractionContext::Guild, InteractionContext::BotDm]);

        let mut remote = RemoteCommand::from_payload(1, &local);
        remote.contexts = Some(vec![InteractionContext::BotDm, InteractionContext::Guild]);
        assert!(remote.equivalent_to(&local));

        remote.contexts = Some(vec![InteractionContext::BotDm]);
        assert!(remote.matches(&local));
        assert!(!remote.equivalent_to(&local));
    }

    #[test]
    fn test_description_change_breaks_match() {
        let remote = RemoteCommand::from_payload(1, &payload("ping"));
        let mut local = payload("ping");
        local.description = "Pong!".to_string();
        assert!(!remote.matches(&local));
    }
}
