//! Command options as declared locally and as returned by the platform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::locale::LocalizedString;

/// Option type, carried on the wire as its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionKind {
    Subcommand,
    SubcommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionKind {
    pub fn is_subcommand_like(self) -> bool {
        matches!(self, Self::Subcommand | Self::SubcommandGroup)
    }
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Subcommand => 1,
            OptionKind::SubcommandGroup => 2,
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
        }
    }
}

impl TryFrom<u8> for OptionKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Subcommand,
            2 => Self::SubcommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            7 => Self::Channel,
            8 => Self::Role,
            9 => Self::Mentionable,
            10 => Self::Number,
            11 => Self::Attachment,
            other => return Err(format!("unknown option type {other}")),
        })
    }
}

/// Value offered by a fixed option choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Number(f64),
    String(String),
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChoice", into = "RawChoice")]
pub struct OptionChoice {
    pub name: LocalizedString,
    pub value: ChoiceValue,
}

#[derive(Serialize, Deserialize)]
struct RawChoice {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name_localizations: Option<BTreeMap<String, String>>,
    value: ChoiceValue,
}

impl From<RawChoice> for OptionChoice {
    fn from(raw: RawChoice) -> Self {
        Self {
            name: LocalizedString::from_wire(raw.name, raw.name_localizations.as_ref()),
            value: raw.value,
        }
    }
}

impl From<OptionChoice> for RawChoice {
    fn from(choice: OptionChoice) -> Self {
        Self {
            name: choice.name.default_value().to_string(),
            name_localizations: choice.name.localizations(),
            value: choice.value,
        }
    }
}

/// One entry in a command's option list.
///
/// Subcommands and subcommand groups are options too; their own
/// parameters live in `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOption", into = "RawOption")]
pub struct CommandOption {
    pub kind: OptionKind,
    pub name: LocalizedString,
    pub description: LocalizedString,
    pub required: bool,
    pub autocomplete: bool,
    pub choices: Vec<OptionChoice>,
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    pub fn new(
        kind: OptionKind,
        name: impl Into<LocalizedString>,
        description: impl Into<LocalizedString>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            autocomplete: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn subcommand(
        name: impl Into<LocalizedString>,
        description: impl Into<LocalizedString>,
        options: Vec<CommandOption>,
    ) -> Self {
        Self {
            options,
            ..Self::new(OptionKind::Subcommand, name, description)
        }
    }

    pub fn subcommand_group(
        name: impl Into<LocalizedString>,
        description: impl Into<LocalizedString>,
        subcommands: Vec<CommandOption>,
    ) -> Self {
        Self {
            options: subcommands,
            ..Self::new(OptionKind::SubcommandGroup, name, description)
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    pub fn choice(mut self, name: impl Into<LocalizedString>, value: impl Into<ChoiceValue>) -> Self {
        self.choices.push(OptionChoice {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn default_name(&self) -> &str {
        self.name.default_value()
    }

    /// Platform equality: nested options are matched by name, not position.
    pub fn semantically_eq(&self, other: &CommandOption) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.description == other.description
            && self.required == other.required
            && self.autocomplete == other.autocomplete
            && self.choices == other.choices
            && options_eq(&self.options, &other.options)
    }
}

/// Compares two option lists the way the platform does.
pub fn options_eq(local: &[CommandOption], remote: &[CommandOption]) -> bool {
    local.len() == remote.len()
        && local.iter().all(|option| {
            remote
                .iter()
                .find(|candidate| candidate.default_name() == option.default_name())
                .is_some_and(|candidate| option.semantically_eq(candidate))
        })
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize, Deserialize)]
struct RawOption {
    #[serde(rename = "type")]
    kind: OptionKind,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name_localizations: Option<BTreeMap<String, String>>,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description_localizations: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    autocomplete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    choices: Vec<OptionChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<CommandOption>,
}

impl From<RawOption> for CommandOption {
    fn from(raw: RawOption) -> Self {
        Self {
            kind: raw.kind,
            name: LocalizedString::from_wire(raw.name, raw.name_localizations.as_ref()),
            description: LocalizedString::from_wire(
                raw.description,
                raw.description_localizations.as_ref(),
            ),
            required: raw.required,
            autocomplete: raw.autocomplete,
            choices: raw.choices,
            options: raw.options,
        }
    }
}

impl From<CommandOption> for RawOption {
    fn from(option: CommandOption) -> Self {
        Self {
            kind: option.kind,
            name: option.name.default_value().to_string(),
            name_localizations: option.name.localizations(),
            description: option.description.default_value().to_string(),
            description_localizations: option.description.localizations(),
            required: option.required,
            autocomplete: option.autocomplete,
            choices: option.choices,
            options: option.options,
        }
    }
}
