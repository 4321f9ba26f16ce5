//! What the router needs to know about an inbound interaction.

use async_trait::async_trait;

use crate::error::BoxError;

/// Platform user or guild identifier.
pub type Snowflake = u64;

/// Event kinds a command can carry a handler for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionKind {
    ChatInput,
    UserContextMenu,
    MessageContextMenu,
    Autocomplete,
    Button,
    SelectMenu,
    ModalSubmit,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 7] = [
        Self::ChatInput,
        Self::UserContextMenu,
        Self::MessageContextMenu,
        Self::Autocomplete,
        Self::Button,
        Self::SelectMenu,
        Self::ModalSubmit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatInput => "chat_input",
            Self::UserContextMenu => "user_context_menu",
            Self::MessageContextMenu => "message_context_menu",
            Self::Autocomplete => "autocomplete",
            Self::Button => "button",
            Self::SelectMenu => "select_menu",
            Self::ModalSubmit => "modal_submit",
        }
    }

    /// Kinds whose payload names the invoked command directly.
    pub fn names_command(self) -> bool {
        matches!(
            self,
            Self::ChatInput | Self::UserContextMenu | Self::MessageContextMenu | Self::Autocomplete
        )
    }

    /// Kinds that may carry a subcommand or group selector.
    pub fn carries_subcommand(self) -> bool {
        matches!(self, Self::ChatInput | Self::Autocomplete)
    }

    pub fn is_component(self) -> bool {
        matches!(self, Self::Button | Self::SelectMenu)
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of an interaction plus the one write the router needs:
/// telling the user something went wrong.
#[async_trait]
pub trait InteractionEvent: Send + Sync {
    fn kind(&self) -> InteractionKind;

    fn user_id(&self) -> Snowflake;

    fn user_name(&self) -> &str;

    /// Invoked command name for command, context menu and autocomplete events.
    fn command_name(&self) -> Option<&str>;

    fn subcommand_group(&self) -> Option<&str>;

    fn subcommand(&self) -> Option<&str>;

    /// Custom identifier of a component or modal.
    fn custom_id(&self) -> Option<&str>;

    /// Command name recorded on the message a component is attached to,
    /// when that message was sent in response to a command.
    fn origin_command_name(&self) -> Option<&str>;

    fn is_repliable(&self) -> bool;

    /// Sends `content` to the user, editing the existing reply if the
    /// interaction was already acknowledged.
    async fn reply_failure(&self, content: &str) -> Result<(), BoxError>;
}
