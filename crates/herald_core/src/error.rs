use miette::Diagnostic;
use thiserror::Error;

use crate::registry::Scope;

/// Error type returned by handlers and permission predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Malformed command definition, raised while building the tree.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Command name is empty")]
    #[diagnostic(
        code(herald::command::empty_name),
        help("Every command needs a non-empty default name")
    )]
    EmptyName,

    #[error("Chat-input command '{command}' has no description")]
    #[diagnostic(
        code(herald::command::missing_description),
        help("Slash commands must carry a description; context menu commands may omit it")
    )]
    MissingDescription { command: String },

    #[error("Localized string has no default entry")]
    #[diagnostic(
        code(herald::locale::missing_default),
        help("Add a \"default\" key to the locale map: {}", locales.join(", "))
    )]
    MissingDefault { locales: Vec<String> },
}

/// Failure while routing or running an interaction.
#[derive(Error, Diagnostic, Debug)]
pub enum DispatchError {
    #[error("Command not found.")]
    #[diagnostic(
        code(herald::router::command_not_found),
        help("No registered command matches '{name}'")
    )]
    CommandNotFound { name: String },

    #[error("{message}")]
    #[diagnostic(
        code(herald::router::permission_denied),
        help("User {user_id} is not allowed to use '{command}'")
    )]
    PermissionDenied {
        command: String,
        user_id: u64,
        message: String,
    },

    #[error("{cause}")]
    #[diagnostic(
        code(herald::router::handler_failed),
        help("The {kind} handler of '{command}' returned an error")
    )]
    HandlerFailed {
        command: String,
        kind: String,
        #[source]
        cause: BoxError,
    },
}

impl DispatchError {
    pub const DENIED_MESSAGE: &'static str = "You do not have permission to use this command.";

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::CommandNotFound { name: name.into() }
    }

    pub fn denied(command: impl Into<String>, user_id: u64) -> Self {
        Self::PermissionDenied {
            command: command.into(),
            user_id,
            message: Self::DENIED_MESSAGE.to_string(),
        }
    }

    /// Text shown to the invoking user when the interaction can be answered.
    pub fn user_message(&self) -> String {
        match self {
            Self::CommandNotFound { .. } => "Command not found.".to_string(),
            Self::PermissionDenied { message, .. } => message.clone(),
            Self::HandlerFailed { cause, .. } => cause.to_string(),
        }
    }
}

/// Failure of a read or write against the remote command registry.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistrationError {
    #[error("Failed to fetch {scope} commands")]
    #[diagnostic(
        code(herald::registry::fetch_failed),
        help("Check that the application id is set and the bot can read its commands")
    )]
    FetchFailed {
        scope: Scope,
        #[source]
        cause: BoxError,
    },

    #[error("Failed to {operation} {scope} command '{command}'")]
    #[diagnostic(
        code(herald::registry::write_failed),
        help("The change for '{command}' was abandoned; other commands were still reconciled")
    )]
    WriteFailed {
        scope: Scope,
        operation: RegistryOperation,
        command: String,
        #[source]
        cause: BoxError,
    },
}

impl RegistrationError {
    pub fn write(
        scope: Scope,
        operation: RegistryOperation,
        command: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::WriteFailed {
            scope,
            operation,
            command: command.into(),
            cause: cause.into(),
        }
    }

    pub fn fetch(scope: Scope, cause: impl Into<BoxError>) -> Self {
        Self::FetchFailed {
            scope,
            cause: cause.into(),
        }
    }
}

/// The remote call a [`RegistrationError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOperation {
    Create,
    BulkOverwrite,
    Edit,
    Delete,
}

impl std::fmt::Display for RegistryOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::BulkOverwrite => write!(f, "overwrite"),
            Self::Edit => write!(f, "edit"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn test_denied_carries_user_message() {
        let error = DispatchError::denied("eval", 42);
        assert_eq!(
            error.user_message(),
            "You do not have permission to use this command."
        );
        assert_eq!(error.to_string(), error.user_message());
    }

    #[test]
    fn test_handler_failure_surfaces_cause() {
        let error = DispatchError::HandlerFailed {
            command: "ping".to_string(),
            kind: "chat_input".to_string(),
            cause: "upstream went away".into(),
        };
        assert_eq!(error.user_message(), "upstream went away");
    }

    #[test]
    fn test_registration_error_diagnostic_code() {
        let error = RegistrationError::write(
            Scope::Guild(7),
            RegistryOperation::Delete,
            "old",
            "missing access",
        );
        assert_eq!(error.to_string(), "Failed to delete guild 7 command 'old'");

        let output = format!("{:?}", Report::new(error));
        assert!(output.contains("write_failed"));
    }
}
