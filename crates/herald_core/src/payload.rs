//! Registration payload sent to the platform's command endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::option::CommandOption;

macro_rules! numeric_wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $($variant),+
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $value),+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} value {}", stringify!($name), other)),
                }
            }
        }
    };
}

numeric_wire_enum! {
    /// How a command is invoked.
    CommandKind {
        ChatInput = 1,
        User = 2,
        Message = 3,
    }
}

numeric_wire_enum! {
    /// Where the application must be installed for the command to show up.
    IntegrationType {
        GuildInstall = 0,
        UserInstall = 1,
    }
}

numeric_wire_enum! {
    /// Surface a command can be used from.
    InteractionContext {
        Guild = 0,
        BotDm = 1,
        PrivateChannel = 2,
    }
}

impl Default for CommandKind {
    fn default() -> Self {
        Self::ChatInput
    }
}

/// Exact body for the create, edit and bulk-overwrite endpoints.
///
/// `contexts` is always present and serializes to `null` when no context
/// was declared; `integration_types` is omitted in that case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandPayload {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_localizations: Option<BTreeMap<String, String>>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_localizations: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<CommandOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_types: Option<Vec<IntegrationType>>,
    pub contexts: Option<Vec<InteractionContext>>,
}

impl CommandPayload {
    pub fn options(&self) -> &[CommandOption] {
        self.options.as_deref().unwrap_or_default()
    }
}
