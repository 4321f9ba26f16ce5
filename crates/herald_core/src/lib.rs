//! Herald Core - Command Tree, Registry Differ and Interaction Router
//!
//! This crate holds everything that does not need a live gateway
//! connection: building validated command descriptors, producing their
//! registration payloads, reconciling them against what the platform has
//! registered, and routing incoming interactions to handlers.
//!
//! It is generic over the handler context `C` and the event type `E`;
//! `herald-discord` plugs in the concrete serenity types.

pub mod command;
pub mod error;
pub mod event;
pub mod locale;
pub mod option;
pub mod payload;
pub mod reconcile;
pub mod registry;
pub mod router;
pub mod set;

#[cfg(test)]
mod test_helpers;

pub use command::{Command, CommandInfo, Handler, HandlerResult, PermissionCheck, SubcommandGroup};
pub use error::{BoxError, DispatchError, RegistrationError, RegistryOperation, ValidationError};
pub use event::{InteractionEvent, InteractionKind, Snowflake};
pub use locale::{DEFAULT_LOCALE, LocalizedString};
pub use option::{ChoiceValue, CommandOption, OptionChoice, OptionKind};
pub use payload::{CommandKind, CommandPayload, IntegrationType, InteractionContext};
pub use reconcile::{ChangeSet, ReconcileReport, ScopeReport, diff, reconcile, reconcile_scope};
pub use registry::{CommandRegistry, RemoteCommand, Scope};
pub use router::{GENERIC_FAILURE, Router, custom_id, parse_custom_id};
pub use set::{CommandSet, Owners};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        BoxError, ChoiceValue, Command, CommandInfo, CommandKind, CommandOption, CommandSet,
        HandlerResult, IntegrationType, InteractionContext, InteractionEvent, InteractionKind,
        LocalizedString, OptionKind, Owners, SubcommandGroup,
    };
}
